use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;

use crate::cli::{open_tablespace, wprintln, FileProgress, Logged};
use crate::innodb::datadir::{traverse_parent_nodes, FileFailure};
use crate::innodb::inventory::ParentNodeInventory;
use crate::innodb::tablespace::WalkSummary;
use crate::util::events::EventLog;
use crate::SalvageError;

/// Options for the nodes subcommand.
pub struct NodesOptions {
    pub datadir: String,
    pub prefix: String,
    pub json: bool,
    pub mmap: bool,
    pub event_log: Option<Arc<EventLog>>,
}

#[derive(Serialize)]
struct NodesJson {
    datadir: String,
    prefix: String,
    files: Vec<WalkSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<FileFailure>,
    inventory: ParentNodeInventory,
}

/// Collect parent-node page numbers for every file whose name starts with
/// `--prefix`.
///
/// Each matching file under the directory (at any depth, any extension) is
/// walked page by page without decoding records. Pages of type 17854 are
/// recorded under the file's name, in the order they appear. The result is
/// printed as a file-to-pages mapping, preceded by the number of pages
/// processed per file.
pub fn execute(opts: &NodesOptions, writer: &mut dyn Write) -> Result<(), SalvageError> {
    let open = |path: &Path| open_tablespace(path, opts.mmap);
    let mut observer = Logged::new(FileProgress::new(), opts.event_log.as_deref());
    let report = traverse_parent_nodes(Path::new(&opts.datadir), &opts.prefix, open, &mut observer)?;
    observer.inner.finish();

    if opts.json {
        let result = NodesJson {
            datadir: opts.datadir.clone(),
            prefix: opts.prefix.clone(),
            files: report.files,
            failures: report.failures,
            inventory: report.inventory,
        };
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| SalvageError::Parse(format!("JSON serialization error: {}", e)))?;
        wprintln!(writer, "{}", json)?;
        return Ok(());
    }

    if report.files.is_empty() && report.failures.is_empty() {
        wprintln!(
            writer,
            "No files starting with '{}' found in {}",
            opts.prefix,
            opts.datadir
        )?;
        return Ok(());
    }

    for summary in &report.files {
        wprintln!(writer, "Processed {} pages from {}", summary.pages, summary.file)?;
    }

    wprintln!(writer)?;
    wprintln!(writer, "{}", "Parent Nodes".bold())?;
    if report.inventory.is_empty() {
        wprintln!(writer, "  (none)")?;
    }
    for (file, pages) in report.inventory.iter() {
        let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
        wprintln!(writer, "  {}: [{}]", file.cyan(), list.join(", "))?;
    }
    wprintln!(
        writer,
        "{} parent-node pages in {} files",
        report.inventory.total_pages(),
        report.inventory.len()
    )?;

    Ok(())
}
