//! Directory-level salvage runs.
//!
//! Walks every matching tablespace under a directory, one file at a time,
//! and folds the parent-node pages of all files into one
//! [`ParentNodeInventory`]. A file that cannot be opened or read is reported
//! to the observer and recorded in the [`RunReport`]; the run moves on to the
//! next file. An I/O error raised by the observer while a file is being
//! walked is charged to that file the same way, and so is a nested directory
//! that cannot be listed. An unreadable root directory, any other error, or a
//! failing `on_file_error` aborts the run.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::innodb::inventory::ParentNodeInventory;
use crate::innodb::observer::WalkObserver;
use crate::innodb::tablespace::{Tablespace, WalkOptions, WalkSummary};
use crate::util::fs::{find_files_with_prefix, find_tablespace_files, Discovery};
use crate::SalvageError;

/// Extension of tablespace files scanned for records.
pub const TABLESPACE_EXTENSION: &str = "ibd";

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Outcome of a directory run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Summaries of files walked to completion.
    pub files: Vec<WalkSummary>,
    pub failures: Vec<FileFailure>,
    pub inventory: ParentNodeInventory,
}

impl RunReport {
    pub fn total_pages(&self) -> u64 {
        self.files.iter().map(|f| f.pages).sum()
    }

    pub fn total_records(&self) -> u64 {
        self.files.iter().map(|f| f.records).sum()
    }
}

/// Walk every `.ibd` file under `dir`, decoding leaf records per `opts`.
///
/// `open` turns a path into a [`Tablespace`], e.g. `|p| Tablespace::open(p)`
/// for buffered reads.
pub fn salvage_directory<F>(
    dir: &Path,
    opts: &WalkOptions<'_>,
    open: F,
    observer: &mut dyn WalkObserver,
) -> Result<RunReport, SalvageError>
where
    F: Fn(&Path) -> Result<Tablespace, SalvageError>,
{
    let found = find_tablespace_files(dir, &[TABLESPACE_EXTENSION])?;
    run_discovery(&found, opts, open, observer)
}

/// Walk every file under `dir` whose name starts with `prefix`, collecting
/// parent-node pages without decoding records.
pub fn traverse_parent_nodes<F>(
    dir: &Path,
    prefix: &str,
    open: F,
    observer: &mut dyn WalkObserver,
) -> Result<RunReport, SalvageError>
where
    F: Fn(&Path) -> Result<Tablespace, SalvageError>,
{
    let found = find_files_with_prefix(dir, prefix)?;
    run_discovery(&found, &WalkOptions::inventory_only(), open, observer)
}

/// Walk an explicit list of files in order.
pub fn run_files<F>(
    files: &[PathBuf],
    opts: &WalkOptions<'_>,
    open: F,
    observer: &mut dyn WalkObserver,
) -> Result<RunReport, SalvageError>
where
    F: Fn(&Path) -> Result<Tablespace, SalvageError>,
{
    observer.on_run_start(files)?;
    walk_files(files, opts, open, observer, RunReport::default())
}

/// Walk the files of a [`Discovery`]. Unreadable nested directories are
/// reported as failures before the first file is walked.
pub fn run_discovery<F>(
    found: &Discovery,
    opts: &WalkOptions<'_>,
    open: F,
    observer: &mut dyn WalkObserver,
) -> Result<RunReport, SalvageError>
where
    F: Fn(&Path) -> Result<Tablespace, SalvageError>,
{
    observer.on_run_start(&found.files)?;
    let mut report = RunReport::default();
    for (path, err) in &found.unreadable {
        let display = path.display().to_string();
        observer.on_file_error(&display, err)?;
        report.failures.push(FileFailure {
            file: display,
            error: err.to_string(),
        });
    }
    walk_files(&found.files, opts, open, observer, report)
}

fn walk_files<F>(
    files: &[PathBuf],
    opts: &WalkOptions<'_>,
    open: F,
    observer: &mut dyn WalkObserver,
    mut report: RunReport,
) -> Result<RunReport, SalvageError>
where
    F: Fn(&Path) -> Result<Tablespace, SalvageError>,
{

    for path in files {
        let display = path.display().to_string();
        // pages of a file that fails midway are not kept in the inventory
        let mut file_inventory = ParentNodeInventory::new();
        let walked = match open(path) {
            Ok(mut ts) => ts
                .walk(opts, &mut file_inventory, observer)
                .map(|summary| (summary, file_inventory)),
            Err(e) => Err(e),
        };

        match walked {
            Ok((summary, file_inventory)) => {
                report.inventory.merge(file_inventory);
                report.files.push(summary);
            }
            Err(err @ SalvageError::Io(_)) => {
                observer.on_file_error(&display, &err)?;
                report.failures.push(FileFailure {
                    file: display,
                    error: err.to_string(),
                });
            }
            Err(other) => return Err(other),
        }
    }

    Ok(report)
}
