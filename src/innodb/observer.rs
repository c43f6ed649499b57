//! Page-visit callbacks.
//!
//! The walker and the directory runner report what they see through a
//! [`WalkObserver`] instead of printing. Every method has a no-op default, so
//! an observer only implements the events it cares about. Returning an error
//! from a callback aborts the current walk (used when an output sink fails).

use std::path::PathBuf;

use serde::Serialize;

use crate::innodb::page_types::PageKind;
use crate::innodb::record::Record;
use crate::innodb::tablespace::WalkSummary;
use crate::SalvageError;

/// One full page as seen by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageVisit {
    /// Position of the page in the file (0-based chunk index).
    pub index: u64,
    /// Page number from the FIL header.
    pub page_number: u32,
    /// Raw page type code.
    pub page_type: u16,
    pub kind: PageKind,
}

/// Receiver for walk events.
pub trait WalkObserver {
    /// Called once by directory runs with the files about to be walked.
    fn on_run_start(&mut self, _files: &[PathBuf]) -> Result<(), SalvageError> {
        Ok(())
    }

    fn on_file_start(&mut self, _file: &str) -> Result<(), SalvageError> {
        Ok(())
    }

    /// Called for every full page, before its records or inventory entry.
    fn on_page(&mut self, _file: &str, _page: &PageVisit) -> Result<(), SalvageError> {
        Ok(())
    }

    fn on_record(
        &mut self,
        _file: &str,
        _page: &PageVisit,
        _record: &Record,
    ) -> Result<(), SalvageError> {
        Ok(())
    }

    fn on_parent_node(&mut self, _file: &str, _page_number: u32) -> Result<(), SalvageError> {
        Ok(())
    }

    /// A page was skipped because its header could not be read.
    fn on_page_error(
        &mut self,
        _file: &str,
        _index: u64,
        _err: &SalvageError,
    ) -> Result<(), SalvageError> {
        Ok(())
    }

    fn on_file_end(&mut self, _file: &str, _summary: &WalkSummary) -> Result<(), SalvageError> {
        Ok(())
    }

    /// A file or nested directory could not be read; the run continues with
    /// the next file.
    fn on_file_error(&mut self, _file: &str, _err: &SalvageError) -> Result<(), SalvageError> {
        Ok(())
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl WalkObserver for NullObserver {}

/// Observer that keeps everything it is told, for tests and library callers.
#[derive(Debug, Default)]
pub struct Collector {
    pub pages: Vec<PageVisit>,
    /// `(page_number, record)` pairs in scan order.
    pub records: Vec<(u32, Record)>,
    /// `(file, page_number)` pairs.
    pub parent_nodes: Vec<(String, u32)>,
    /// `(file, message)` pairs for page and file errors.
    pub errors: Vec<(String, String)>,
    pub finished: Vec<WalkSummary>,
}

impl WalkObserver for Collector {
    fn on_page(&mut self, _file: &str, page: &PageVisit) -> Result<(), SalvageError> {
        self.pages.push(*page);
        Ok(())
    }

    fn on_record(
        &mut self,
        _file: &str,
        page: &PageVisit,
        record: &Record,
    ) -> Result<(), SalvageError> {
        self.records.push((page.page_number, record.clone()));
        Ok(())
    }

    fn on_parent_node(&mut self, file: &str, page_number: u32) -> Result<(), SalvageError> {
        self.parent_nodes.push((file.to_string(), page_number));
        Ok(())
    }

    fn on_page_error(
        &mut self,
        file: &str,
        index: u64,
        err: &SalvageError,
    ) -> Result<(), SalvageError> {
        self.errors
            .push((file.to_string(), format!("page {}: {}", index, err)));
        Ok(())
    }

    fn on_file_end(&mut self, _file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        self.finished.push(summary.clone());
        Ok(())
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        self.errors.push((file.to_string(), err.to_string()));
        Ok(())
    }
}
