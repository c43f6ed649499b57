use clap::CommandFactory;
use clap_complete::{Generator, Shell};
use clap_mangen::Man;
use std::path::{Path, PathBuf};

// Include the CLI definition from the library crate
include!("src/cli/app.rs");

fn create_dir(dir: &Path) {
    std::fs::create_dir_all(dir)
        .unwrap_or_else(|e| panic!("cannot create {}: {}", dir.display(), e));
}

fn write_file(path: &Path, contents: Vec<u8>) {
    std::fs::write(path, contents)
        .unwrap_or_else(|e| panic!("cannot write {}: {}", path.display(), e));
}

fn render_man(cmd: clap::Command, path: &Path) {
    let mut buf = Vec::new();
    Man::new(cmd)
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("cannot render {}: {}", path.display(), e));
    write_file(path, buf);
}

fn main() {
    let out_dir =
        PathBuf::from(std::env::var("OUT_DIR").unwrap_or_else(|_| "target/man".to_string()));
    let man_dir = out_dir.join("man");
    create_dir(&man_dir);

    let cmd = Cli::command();
    render_man(cmd.clone(), &man_dir.join("salvage.1"));

    // One page per subcommand
    for sub in cmd.get_subcommands() {
        let name = format!("salvage-{}.1", sub.get_name());
        render_man(sub.clone(), &man_dir.join(name));
    }

    let completions_dir = out_dir.join("completions");
    create_dir(&completions_dir);

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        clap_complete::generate(shell, &mut cmd, "salvage", &mut buf);
        write_file(&completions_dir.join(shell.file_name("salvage")), buf);
    }

    println!("cargo:rerun-if-changed=src/cli/app.rs");
}
