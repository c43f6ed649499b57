//! NDJSON event log for salvage runs.
//!
//! [`EventLog`] appends one JSON object per line to a log file: a
//! `run_start`/`run_end` pair per invocation and, in between, one event per
//! file and page the walker visits. It implements [`WalkObserver`] so it can
//! be driven by the same callbacks as the console output.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;

use chrono::Local;
use fs2::FileExt;
use serde::Serialize;

use crate::innodb::observer::{PageVisit, WalkObserver};
use crate::innodb::page_types::PageKind;
use crate::innodb::tablespace::WalkSummary;
use crate::SalvageError;

/// A single event, serialized as tagged NDJSON.
#[derive(Serialize)]
#[serde(tag = "event")]
pub enum Event {
    /// Emitted once at the start of a CLI invocation.
    #[serde(rename = "run_start")]
    RunStart {
        timestamp: String,
        args: Vec<String>,
        version: String,
    },

    #[serde(rename = "file_start")]
    FileStart { timestamp: String, file: String },

    /// Emitted for every full page read.
    #[serde(rename = "page")]
    Page {
        timestamp: String,
        file: String,
        index: u64,
        page_number: u32,
        page_type: u16,
        kind: PageKind,
    },

    #[serde(rename = "parent_node")]
    ParentNode {
        timestamp: String,
        file: String,
        page_number: u32,
    },

    #[serde(rename = "page_error")]
    PageError {
        timestamp: String,
        file: String,
        index: u64,
        error: String,
    },

    #[serde(rename = "file_end")]
    FileEnd {
        timestamp: String,
        file: String,
        pages: u64,
        leaf_pages: u64,
        parent_pages: u64,
        records: u64,
    },

    #[serde(rename = "file_error")]
    FileError {
        timestamp: String,
        file: String,
        error: String,
    },

    /// Emitted once at the end of a CLI invocation.
    #[serde(rename = "run_end")]
    RunEnd {
        timestamp: String,
        duration_ms: u64,
        files: u64,
        pages: u64,
        records: u64,
        file_errors: u64,
    },
}

#[derive(Default)]
struct Counters {
    files: u64,
    pages: u64,
    records: u64,
    file_errors: u64,
}

struct EventLogInner {
    file: File,
    counters: Counters,
}

/// Thread-safe event log that appends NDJSON lines to a file.
///
/// Each line is written under an exclusive `fs2` file lock so several
/// processes can share one log.
pub struct EventLog {
    inner: Mutex<EventLogInner>,
    start: Instant,
}

impl EventLog {
    /// Open (or create) the log file in append mode.
    pub fn open(path: &str) -> Result<Self, SalvageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SalvageError::Io(format!("Cannot open event log {}: {}", path, e)))?;

        Ok(Self {
            inner: Mutex::new(EventLogInner {
                file,
                counters: Counters::default(),
            }),
            start: Instant::now(),
        })
    }

    /// Emit a single event as one NDJSON line.
    pub fn emit(&self, event: &Event) -> Result<(), SalvageError> {
        let line = serde_json::to_string(event)
            .map_err(|e| SalvageError::Parse(format!("Event JSON error: {}", e)))?;

        let mut inner = self
            .inner
            .lock()
            .map_err(|_| SalvageError::Io("Event log lock poisoned".to_string()))?;
        write_locked(&mut inner.file, &line)
    }

    fn count(&self, update: impl FnOnce(&mut Counters)) {
        if let Ok(mut inner) = self.inner.lock() {
            update(&mut inner.counters);
        }
    }

    /// Emit a `run_start` event.
    pub fn start_run(&self, args: Vec<String>) -> Result<(), SalvageError> {
        self.emit(&Event::RunStart {
            timestamp: now(),
            args,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Emit a `run_end` event with accumulated counters.
    pub fn end_run(&self) -> Result<(), SalvageError> {
        let event = {
            let inner = self
                .inner
                .lock()
                .map_err(|_| SalvageError::Io("Event log lock poisoned".to_string()))?;
            Event::RunEnd {
                timestamp: now(),
                duration_ms: self.start.elapsed().as_millis() as u64,
                files: inner.counters.files,
                pages: inner.counters.pages,
                records: inner.counters.records,
                file_errors: inner.counters.file_errors,
            }
        };
        self.emit(&event)
    }
}

fn write_locked(file: &mut File, line: &str) -> Result<(), SalvageError> {
    file.lock_exclusive()
        .map_err(|e| SalvageError::Io(format!("Event log lock error: {}", e)))?;
    let written = writeln!(file, "{}", line).and_then(|_| file.flush());
    let unlocked = FileExt::unlock(file);
    written.map_err(|e| SalvageError::Io(format!("Event log write error: {}", e)))?;
    unlocked.map_err(|e| SalvageError::Io(format!("Event log unlock error: {}", e)))
}

fn now() -> String {
    Local::now().to_rfc3339()
}

impl WalkObserver for &EventLog {
    fn on_file_start(&mut self, file: &str) -> Result<(), SalvageError> {
        self.emit(&Event::FileStart {
            timestamp: now(),
            file: file.to_string(),
        })
    }

    fn on_page(&mut self, file: &str, page: &PageVisit) -> Result<(), SalvageError> {
        self.emit(&Event::Page {
            timestamp: now(),
            file: file.to_string(),
            index: page.index,
            page_number: page.page_number,
            page_type: page.page_type,
            kind: page.kind,
        })
    }

    fn on_parent_node(&mut self, file: &str, page_number: u32) -> Result<(), SalvageError> {
        self.emit(&Event::ParentNode {
            timestamp: now(),
            file: file.to_string(),
            page_number,
        })
    }

    fn on_page_error(
        &mut self,
        file: &str,
        index: u64,
        err: &SalvageError,
    ) -> Result<(), SalvageError> {
        self.emit(&Event::PageError {
            timestamp: now(),
            file: file.to_string(),
            index,
            error: err.to_string(),
        })
    }

    fn on_file_end(&mut self, file: &str, summary: &WalkSummary) -> Result<(), SalvageError> {
        self.count(|c| {
            c.files += 1;
            c.pages += summary.pages;
            c.records += summary.records;
        });
        self.emit(&Event::FileEnd {
            timestamp: now(),
            file: file.to_string(),
            pages: summary.pages,
            leaf_pages: summary.leaf_pages,
            parent_pages: summary.parent_pages,
            records: summary.records,
        })
    }

    fn on_file_error(&mut self, file: &str, err: &SalvageError) -> Result<(), SalvageError> {
        self.count(|c| c.file_errors += 1);
        self.emit(&Event::FileError {
            timestamp: now(),
            file: file.to_string(),
            error: err.to_string(),
        })
    }
}
