#[cfg(not(feature = "cli"))]
compile_error!("The `salvage` binary requires the `cli` feature. Build with `--features cli`.");

use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::process;
use std::sync::Arc;

use salvage::cli;
use salvage::cli::app::{Cli, ColorMode, Commands};
use salvage::util::events::EventLog;
use salvage::SalvageError;

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {} // colored auto-detects tty
    }

    let writer_result: Result<Box<dyn Write>, SalvageError> = match &cli.output {
        Some(path) => File::create(path)
            .map(|f| Box::new(f) as Box<dyn Write>)
            .map_err(|e| SalvageError::Io(format!("Cannot create {}: {}", path, e))),
        None => Ok(Box::new(std::io::stdout()) as Box<dyn Write>),
    };

    let mut writer = match writer_result {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let event_log: Option<Arc<EventLog>> = match &cli.event_log {
        Some(path) => {
            let log = match EventLog::open(path) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            let args: Vec<String> = std::env::args().collect();
            if let Err(e) = log.start_run(args) {
                eprintln!("Warning: {}", e);
            }
            Some(Arc::new(log))
        }
        None => None,
    };

    let result = match cli.command {
        Commands::Extract {
            datadir,
            schema,
            schema_file,
            record_start,
            stride,
            json,
        } => cli::extract::execute(
            &cli::extract::ExtractOptions {
                datadir,
                schema,
                schema_file,
                record_start,
                stride,
                json,
                mmap: cli.mmap,
                event_log: event_log.clone(),
            },
            &mut writer,
        ),

        Commands::Nodes {
            datadir,
            prefix,
            json,
        } => cli::nodes::execute(
            &cli::nodes::NodesOptions {
                datadir,
                prefix,
                json,
                mmap: cli.mmap,
                event_log: event_log.clone(),
            },
            &mut writer,
        ),

        Commands::Pages { file, json } => cli::pages::execute(
            &cli::pages::PagesOptions {
                file,
                json,
                mmap: cli.mmap,
                event_log: event_log.clone(),
            },
            &mut writer,
        ),

        Commands::Scan {
            file,
            page,
            schema,
            schema_file,
            record_start,
            stride,
            json,
        } => cli::scan::execute(
            &cli::scan::ScanOptions {
                file,
                page,
                schema,
                schema_file,
                record_start,
                stride,
                json,
                mmap: cli.mmap,
                event_log: event_log.clone(),
            },
            &mut writer,
        ),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "salvage", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Some(ref log) = event_log {
        let _ = log.end_run();
    }

    if let Err(e) = result.and_then(|_| {
        writer
            .flush()
            .map_err(|e| SalvageError::Io(format!("Cannot flush output: {}", e)))
    }) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
