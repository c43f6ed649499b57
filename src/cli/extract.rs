use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_tablespace, resolve_layout, resolve_schema, wprintln, FileProgress, Logged};
use crate::innodb::datadir::{salvage_directory, FileFailure};
use crate::innodb::observer::{PageVisit, WalkObserver};
use crate::innodb::record::Record;
use crate::innodb::scanner::ScanLayout;
use crate::innodb::tablespace::{WalkOptions, WalkSummary};
use crate::util::events::EventLog;
use crate::SalvageError;

/// Options for the extract subcommand.
pub struct ExtractOptions {
    pub datadir: String,
    pub schema: Option<String>,
    pub schema_file: Option<String>,
    pub record_start: Option<usize>,
    pub stride: Option<usize>,
    pub json: bool,
    pub mmap: bool,
    pub event_log: Option<Arc<EventLog>>,
}

/// One decoded record with the page it came from.
#[derive(Serialize)]
pub(crate) struct RowJson {
    pub page_number: u32,
    pub record: Record,
}

#[derive(Serialize)]
struct FileRowsJson {
    #[serde(flatten)]
    summary: WalkSummary,
    rows: Vec<RowJson>,
}

#[derive(Serialize)]
struct ExtractJson {
    datadir: String,
    schema: String,
    layout: ScanLayout,
    files: Vec<FileRowsJson>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FileFailure>,
    total_pages: u64,
    total_records: u64,
}

/// Prints records as they are decoded, with a summary line per file.
pub(crate) struct RecordPrinter<'w> {
    pub writer: &'w mut dyn Write,
}

impl WalkObserver for RecordPrinter<'_> {
    fn on_file_start(&mut self, file: &str) -> Result<(), SalvageError> {
        wprintln!(self.writer, "{} {}", "Processing".bold(), file)
    }

    fn on_record(
        &mut self,
        _file: &str,
        page: &PageVisit,
        record: &Record,
    ) -> Result<(), SalvageError> {
        wprintln!(self.writer, "  page {:>6}  {}", page.page_number, record)
    }

    fn on_page_error(
        &mut self,
        file: &str,
        index: u64,
        err: &SalvageError,
    ) -> Result<(), SalvageError> {
        eprintln!("{}: {}: page #{}: {}", "Warning".yellow(), file, index, err);
        Ok(())
    }

    fn on_file_end(&mut self, _file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        wprintln!(
            self.writer,
            "  {} pages ({} leaf, {} parent, {} other), {} records",
            summary.pages,
            summary.leaf_pages,
            summary.parent_pages,
            summary.other_pages,
            summary.records.to_string().green()
        )
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        crate::cli::warn_file(file, err);
        Ok(())
    }
}

/// Buffers rows per file for the JSON document.
#[derive(Default)]
struct RowCollector {
    files: Vec<FileRowsJson>,
    current: Vec<RowJson>,
}

impl WalkObserver for RowCollector {
    fn on_file_start(&mut self, _file: &str) -> Result<(), SalvageError> {
        self.current.clear();
        Ok(())
    }

    fn on_record(
        &mut self,
        _file: &str,
        page: &PageVisit,
        record: &Record,
    ) -> Result<(), SalvageError> {
        self.current.push(RowJson {
            page_number: page.page_number,
            record: record.clone(),
        });
        Ok(())
    }

    fn on_file_end(&mut self, _file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        self.files.push(FileRowsJson {
            summary: summary.clone(),
            rows: std::mem::take(&mut self.current),
        });
        Ok(())
    }
}

/// Pairs the row collector with a file progress bar.
struct JsonSink {
    rows: RowCollector,
    progress: FileProgress,
}

impl WalkObserver for JsonSink {
    fn on_run_start(&mut self, files: &[std::path::PathBuf]) -> Result<(), SalvageError> {
        self.progress.on_run_start(files)
    }

    fn on_file_start(&mut self, file: &str) -> Result<(), SalvageError> {
        self.rows.on_file_start(file)
    }

    fn on_record(
        &mut self,
        file: &str,
        page: &PageVisit,
        record: &Record,
    ) -> Result<(), SalvageError> {
        self.rows.on_record(file, page, record)
    }

    fn on_file_end(&mut self, file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        self.rows.on_file_end(file, summary)?;
        self.progress.on_file_end(file, summary)
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        self.progress.on_file_error(file, err)
    }
}

/// Decode leaf page records from every `.ibd` file under a directory.
///
/// Files are discovered recursively and walked in sorted order, one 16 KiB
/// page at a time. Every leaf page (type 17855) is scanned in fixed strides
/// from the record region start and each slot is decoded with the schema
/// (`--schema`, `--schema-file`, or the built-in `wp_newsletter` layout).
/// Parent-node and other pages are counted but not decoded.
///
/// A file that cannot be opened or read is reported on stderr and skipped;
/// the remaining files are still processed.
///
/// In text mode records are printed as they are decoded, followed by a
/// per-file summary and a run total. With `--json`, a single document holds
/// every file's summary and rows.
pub fn execute(opts: &ExtractOptions, writer: &mut dyn Write) -> Result<(), SalvageError> {
    let schema = resolve_schema(opts.schema.as_deref(), opts.schema_file.as_deref())?;
    let layout = resolve_layout(opts.record_start, opts.stride)?;
    let walk_opts = WalkOptions::extract(&schema).with_layout(layout);
    let open = |path: &Path| open_tablespace(path, opts.mmap);
    let log = opts.event_log.as_deref();
    let datadir = Path::new(&opts.datadir);

    if opts.json {
        let mut sink = Logged::new(
            JsonSink {
                rows: RowCollector::default(),
                progress: FileProgress::new(),
            },
            log,
        );
        let report = salvage_directory(datadir, &walk_opts, open, &mut sink)?;
        sink.inner.progress.finish();

        let result = ExtractJson {
            datadir: opts.datadir.clone(),
            schema: schema.to_string(),
            layout,
            total_pages: report.total_pages(),
            total_records: report.total_records(),
            files: sink.inner.rows.files,
            failures: report.failures,
        };
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| SalvageError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    let report = {
        let mut printer = Logged::new(RecordPrinter { writer: &mut *writer }, log);
        salvage_directory(datadir, &walk_opts, open, &mut printer)?
    };

    if report.files.is_empty() && report.failures.is_empty() {
        wprintln!(writer, "No .ibd files found in {}", opts.datadir)?;
        return Ok(());
    }

    wprintln!(writer)?;
    wprintln!(
        writer,
        "{} {} files, {} pages, {} records",
        "Processed".bold(),
        report.files.len(),
        report.total_pages(),
        report.total_records()
    )?;
    if !report.failures.is_empty() {
        wprintln!(
            writer,
            "{}",
            format!("{} files could not be read", report.failures.len()).yellow()
        )?;
    }

    Ok(())
}
