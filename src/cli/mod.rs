//! CLI subcommand implementations for the `salvage` binary.
//!
//! CLI argument parsing uses clap derive macros, with the top-level
//! [`app::Cli`] struct and [`app::Commands`] enum defined in [`app`] and
//! shared between `main.rs` and `build.rs` (for man page generation) via
//! `include!()`.
//!
//! Each subcommand module follows the same pattern: an `Options` struct
//! holding the parsed arguments and a
//! `pub fn execute(opts, writer) -> Result<(), SalvageError>` entry point.
//! The `writer: &mut dyn Write` parameter allows output to be captured in
//! tests or redirected to a file via the global `--output` flag.
//!
//! # Subcommands
//!
//! | Command | Module | Purpose |
//! |---------|--------|---------|
//! | `salvage extract` | [`extract`] | Decode leaf records from every `.ibd` file under a directory |
//! | `salvage nodes` | [`nodes`] | Collect parent-node page numbers for files matching a prefix |
//! | `salvage pages` | [`pages`] | List every page of one file with its type and kind |
//! | `salvage scan` | [`scan`] | Decode records from one file, or from one page of it |
//!
//! # Common patterns
//!
//! - **`--json`**: structured output via `#[derive(Serialize)]` structs and
//!   `serde_json`.
//! - **`--schema` / `--schema-file`**: record layout; the `wp_newsletter`
//!   layout is used when neither is given.
//! - **`--color`** (global): colored terminal output (`auto`, `always`, `never`).
//! - **`--output` / `-o`** (global): write output to a file instead of stdout.
//! - **`--event-log`** (global): append NDJSON run events to a file.
//!
//! Progress bars (via [`indicatif`]) are shown while directory runs collect
//! JSON or inventory output. The `wprintln!` macro wraps `writeln!` to
//! convert `io::Error` into `SalvageError`.

pub mod app;
pub mod extract;
pub mod nodes;
pub mod pages;
pub mod scan;

/// Write a line to the given writer, converting io::Error to SalvageError.
macro_rules! wprintln {
    ($w:expr) => {
        writeln!($w).map_err(|e| $crate::SalvageError::Io(e.to_string()))
    };
    ($w:expr, $($arg:tt)*) => {
        writeln!($w, $($arg)*).map_err(|e| $crate::SalvageError::Io(e.to_string()))
    };
}

pub(crate) use wprintln;

use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::innodb::observer::{PageVisit, WalkObserver};
use crate::innodb::page_types::PageKind;
use crate::innodb::record::Record;
use crate::innodb::scanner::ScanLayout;
use crate::innodb::schema::Schema;
use crate::innodb::tablespace::{Tablespace, WalkSummary};
use crate::util::events::EventLog;
use crate::SalvageError;

/// Open a tablespace file, selecting mmap or buffered I/O based on the flag.
pub(crate) fn open_tablespace(path: &Path, use_mmap: bool) -> Result<Tablespace, SalvageError> {
    if use_mmap {
        Tablespace::open_mmap(path)
    } else {
        Tablespace::open(path)
    }
}

/// Pick the record layout from `--schema` or `--schema-file`, falling back
/// to the `wp_newsletter` layout.
pub(crate) fn resolve_schema(
    inline: Option<&str>,
    file: Option<&str>,
) -> Result<Schema, SalvageError> {
    match (inline, file) {
        (Some(_), Some(_)) => Err(SalvageError::Argument(
            "--schema and --schema-file are mutually exclusive".to_string(),
        )),
        (Some(spec), None) => Schema::parse(spec),
        (None, Some(path)) => Schema::load(path),
        (None, None) => Ok(Schema::wp_newsletter()),
    }
}

/// Build the scan layout from optional `--record-start` / `--stride` overrides.
pub(crate) fn resolve_layout(
    record_start: Option<usize>,
    stride: Option<usize>,
) -> Result<ScanLayout, SalvageError> {
    let default = ScanLayout::default();
    ScanLayout::new(
        record_start.unwrap_or(default.record_start),
        stride.unwrap_or(default.stride),
    )
}

/// Create a styled progress bar for iterating over pages or files.
pub(crate) fn create_progress_bar(count: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(count);
    let template = format!(
        "{{spinner:.green}} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{eta}})",
        unit
    );
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Colored kind label for console output.
pub(crate) fn kind_label(kind: PageKind) -> String {
    match kind {
        PageKind::LeafRecords => kind.label().green().to_string(),
        PageKind::ParentNode => kind.label().cyan().to_string(),
        PageKind::Other => kind.label().dimmed().to_string(),
    }
}

/// Report a skipped file on stderr.
pub(crate) fn warn_file(file: &str, err: &SalvageError) {
    eprintln!("{}: skipping {}: {}", "Warning".yellow(), file, err);
}

/// Forwards every event to the event log (when enabled) and then to `inner`.
pub(crate) struct Logged<'a, O> {
    pub inner: O,
    pub log: Option<&'a EventLog>,
}

impl<'a, O: WalkObserver> Logged<'a, O> {
    pub fn new(inner: O, log: Option<&'a EventLog>) -> Self {
        Logged { inner, log }
    }
}

impl<O: WalkObserver> WalkObserver for Logged<'_, O> {
    fn on_run_start(&mut self, files: &[PathBuf]) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_run_start(files)?;
        }
        self.inner.on_run_start(files)
    }

    fn on_file_start(&mut self, file: &str) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_file_start(file)?;
        }
        self.inner.on_file_start(file)
    }

    fn on_page(&mut self, file: &str, page: &PageVisit) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_page(file, page)?;
        }
        self.inner.on_page(file, page)
    }

    fn on_record(
        &mut self,
        file: &str,
        page: &PageVisit,
        record: &Record,
    ) -> Result<(), SalvageError> {
        // records go to the output, not the event log
        self.inner.on_record(file, page, record)
    }

    fn on_parent_node(&mut self, file: &str, page_number: u32) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_parent_node(file, page_number)?;
        }
        self.inner.on_parent_node(file, page_number)
    }

    fn on_page_error(
        &mut self,
        file: &str,
        index: u64,
        err: &SalvageError,
    ) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_page_error(file, index, err)?;
        }
        self.inner.on_page_error(file, index, err)
    }

    fn on_file_end(&mut self, file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_file_end(file, summary)?;
        }
        self.inner.on_file_end(file, summary)
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        if let Some(mut log) = self.log {
            log.on_file_error(file, err)?;
        }
        self.inner.on_file_error(file, err)
    }
}

/// Advances a progress bar once per finished or failed file.
#[derive(Default)]
pub(crate) struct FileProgress {
    pb: Option<ProgressBar>,
}

impl FileProgress {
    pub fn new() -> Self {
        FileProgress { pb: None }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

impl WalkObserver for FileProgress {
    fn on_run_start(&mut self, files: &[PathBuf]) -> Result<(), SalvageError> {
        self.pb = Some(create_progress_bar(files.len() as u64, "files"));
        Ok(())
    }

    fn on_file_end(&mut self, _file: &str, _summary: &WalkSummary) -> Result<(), SalvageError> {
        if let Some(pb) = &self.pb {
            pb.inc(1);
        }
        Ok(())
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        match &self.pb {
            Some(pb) => {
                pb.suspend(|| warn_file(file, err));
                pb.inc(1);
            }
            None => warn_file(file, err),
        }
        Ok(())
    }
}
