use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{kind_label, open_tablespace, wprintln, Logged};
use crate::innodb::inventory::ParentNodeInventory;
use crate::innodb::observer::Collector;
use crate::innodb::page_types::{type_name, PageKind};
use crate::innodb::tablespace::{WalkOptions, WalkSummary};
use crate::util::events::EventLog;
use crate::SalvageError;

/// Options for the pages subcommand.
pub struct PagesOptions {
    pub file: String,
    pub json: bool,
    pub mmap: bool,
    pub event_log: Option<Arc<EventLog>>,
}

#[derive(Serialize)]
struct PageJson {
    index: u64,
    page_number: u32,
    page_type: u16,
    type_name: &'static str,
    kind: PageKind,
}

#[derive(Serialize)]
struct PagesJson {
    file: String,
    pages: Vec<PageJson>,
    summary: WalkSummary,
}

/// List every full page of a tablespace file.
///
/// For each 16 KiB page this prints its position in the file, the page
/// number and type code from the FIL header, the type's name, and the kind
/// the walker routes it as. A trailing partial page is not listed. A kind
/// summary follows the listing.
pub fn execute(opts: &PagesOptions, writer: &mut dyn Write) -> Result<(), SalvageError> {
    let mut ts = open_tablespace(Path::new(&opts.file), opts.mmap)?;
    let mut observer = Logged::new(Collector::default(), opts.event_log.as_deref());
    let summary = ts.walk(
        &WalkOptions::inventory_only(),
        &mut ParentNodeInventory::new(),
        &mut observer,
    )?;
    let collected = observer.inner;

    for (file, message) in &collected.errors {
        eprintln!("{}: {}: {}", "Warning".yellow(), file, message);
    }

    if opts.json {
        let pages = collected
            .pages
            .iter()
            .map(|p| PageJson {
                index: p.index,
                page_number: p.page_number,
                page_type: p.page_type,
                type_name: type_name(p.page_type),
                kind: p.kind,
            })
            .collect();
        let result = PagesJson {
            file: opts.file.clone(),
            pages,
            summary,
        };
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| SalvageError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    wprintln!(writer, "Pages in {} ({} pages):", opts.file, summary.pages)?;
    wprintln!(
        writer,
        "{:>8}  {:>10}  {:>6}  {:<16}  {}",
        "#",
        "Page",
        "Type",
        "Name",
        "Kind"
    )?;
    wprintln!(writer, "{}", "-".repeat(56))?;
    for page in &collected.pages {
        wprintln!(
            writer,
            "{:>8}  {:>10}  {:>6}  {:<16}  {}",
            page.index,
            page.page_number,
            page.page_type,
            type_name(page.page_type),
            kind_label(page.kind)
        )?;
    }

    let mut by_name: BTreeMap<&str, u64> = BTreeMap::new();
    for page in &collected.pages {
        *by_name.entry(type_name(page.page_type)).or_insert(0) += 1;
    }

    wprintln!(writer)?;
    wprintln!(writer, "{}", "Page Kind Summary".bold())?;
    wprintln!(writer, "  {:20} {:>6}", "leaf", summary.leaf_pages)?;
    wprintln!(writer, "  {:20} {:>6}", "parent", summary.parent_pages)?;
    wprintln!(writer, "  {:20} {:>6}", "other", summary.other_pages)?;
    if summary.skipped_pages > 0 {
        wprintln!(writer, "  {:20} {:>6}", "skipped", summary.skipped_pages)?;
    }

    wprintln!(writer)?;
    wprintln!(writer, "{}", "Page Type Summary".bold())?;
    let mut sorted: Vec<_> = by_name.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, count) in sorted {
        let label = if count == 1 { "page" } else { "pages" };
        wprintln!(writer, "  {:20} {:>6} {}", name, count, label)?;
    }

    Ok(())
}
