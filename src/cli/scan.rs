use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::extract::{RecordPrinter, RowJson};
use crate::cli::{kind_label, open_tablespace, resolve_layout, resolve_schema, wprintln, Logged};
use crate::innodb::inventory::ParentNodeInventory;
use crate::innodb::observer::Collector;
use crate::innodb::page::Page;
use crate::innodb::page_types::{type_name, PageKind};
use crate::innodb::record::Record;
use crate::innodb::scanner::LeafScanner;
use crate::innodb::tablespace::{WalkOptions, WalkSummary};
use crate::util::events::EventLog;
use crate::SalvageError;

/// Options for the scan subcommand.
pub struct ScanOptions {
    pub file: String,
    pub page: Option<u64>,
    pub schema: Option<String>,
    pub schema_file: Option<String>,
    pub record_start: Option<usize>,
    pub stride: Option<usize>,
    pub json: bool,
    pub mmap: bool,
    pub event_log: Option<Arc<EventLog>>,
}

#[derive(Serialize)]
struct SlotJson {
    offset: usize,
    record: Record,
}

#[derive(Serialize)]
struct PageScanJson {
    file: String,
    index: u64,
    page_number: u32,
    page_type: u16,
    type_name: &'static str,
    kind: PageKind,
    records: Vec<SlotJson>,
}

#[derive(Serialize)]
struct FileScanJson {
    #[serde(flatten)]
    summary: WalkSummary,
    rows: Vec<RowJson>,
}

/// Decode records from a single tablespace file.
///
/// Without `--page`, the whole file is walked exactly as `extract` walks each
/// file of a directory: only leaf pages are scanned.
///
/// With `--page N`, only the N-th page of the file (0-based position) is
/// scanned, whatever its type, and each record is shown with the byte offset
/// of its slot. Asking for a page past the last full page is an error.
pub fn execute(opts: &ScanOptions, writer: &mut dyn Write) -> Result<(), SalvageError> {
    let schema = resolve_schema(opts.schema.as_deref(), opts.schema_file.as_deref())?;
    let layout = resolve_layout(opts.record_start, opts.stride)?;
    let mut ts = open_tablespace(Path::new(&opts.file), opts.mmap)?;

    if let Some(target) = opts.page {
        let mut data = None;
        while let Some(buf) = ts.next_page()? {
            if ts.pages_read() - 1 == target {
                data = Some(buf);
                break;
            }
        }
        let data = data.ok_or_else(|| {
            SalvageError::Argument(format!(
                "Page {} is beyond the end of {} ({} full pages)",
                target,
                opts.file,
                ts.pages_read()
            ))
        })?;

        let page = Page::parse(&data)?;
        let mut scanner = LeafScanner::new(page.data(), &schema, &layout);
        let mut slots = Vec::new();
        loop {
            let offset = scanner.offset();
            match scanner.next() {
                Some(record) => slots.push(SlotJson { offset, record }),
                None => break,
            }
        }

        if opts.json {
            let result = PageScanJson {
                file: opts.file.clone(),
                index: target,
                page_number: page.number(),
                page_type: page.page_type(),
                type_name: type_name(page.page_type()),
                kind: page.kind(),
                records: slots,
            };
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| SalvageError::Parse(format!("JSON serialization error: {}", e)))?;
            wprintln!(writer, "{}", json)?;
            return Ok(());
        }

        wprintln!(
            writer,
            "Page {} (#{} in {}): type {} {} [{}]",
            page.number(),
            target,
            opts.file,
            page.page_type(),
            type_name(page.page_type()),
            kind_label(page.kind())
        )?;
        if page.kind() != PageKind::LeafRecords {
            eprintln!(
                "{}: page {} is not a leaf page; slots decoded anyway",
                "Note".yellow(),
                page.number()
            );
        }
        for slot in &slots {
            wprintln!(writer, "  @{:<6} {}", slot.offset, slot.record)?;
        }
        wprintln!(writer, "{} records", slots.len())?;
        return Ok(());
    }

    let walk_opts = WalkOptions::extract(&schema).with_layout(layout);
    let log = opts.event_log.as_deref();

    if opts.json {
        let mut observer = Logged::new(Collector::default(), log);
        let summary = ts.walk(&walk_opts, &mut ParentNodeInventory::new(), &mut observer)?;
        let rows = observer
            .inner
            .records
            .into_iter()
            .map(|(page_number, record)| RowJson {
                page_number,
                record,
            })
            .collect();
        let json = serde_json::to_string_pretty(&FileScanJson { summary, rows })
            .map_err(|e| SalvageError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    let mut printer = Logged::new(RecordPrinter { writer }, log);
    ts.walk(&walk_opts, &mut ParentNodeInventory::new(), &mut printer)?;
    Ok(())
}
