//! Offline row salvage from InnoDB tablespace files.
//!
//! The `innodb-salvage` crate (library name `salvage`) recovers row data from
//! raw `.ibd` files without a running MySQL server. It walks a tablespace in
//! 16 KiB pages, classifies every page from its FIL header, and decodes
//! fixed-width records out of leaf pages using a caller-supplied [`Schema`].
//!
//! It targets a single known table shape. Variable-length and compressed row
//! formats, undo/redo logs, and schema inference are not handled.
//!
//! # CLI Reference
//!
//! | Command | Purpose |
//! |---------|---------|
//! | [`salvage extract`](cli::app::Commands::Extract) | Decode records from every `.ibd` file under a directory |
//! | [`salvage nodes`](cli::app::Commands::Nodes) | Inventory parent-node pages for files matching a table prefix |
//! | [`salvage pages`](cli::app::Commands::Pages) | List page numbers, type codes, and kinds of one file |
//! | [`salvage scan`](cli::app::Commands::Scan) | Decode records from one file, or one page of it |
//!
//! All subcommands accept `--color <auto|always|never>`, `--output <file>`
//! and `--event-log <file>`; most accept `--json`.
//!
//! # Library API
//!
//! ```no_run
//! use salvage::innodb::inventory::ParentNodeInventory;
//! use salvage::innodb::observer::Collector;
//! use salvage::innodb::schema::Schema;
//! use salvage::innodb::tablespace::{Tablespace, WalkOptions};
//!
//! let schema = Schema::parse("id:int,email:string,active:bool").unwrap();
//! let mut ts = Tablespace::open("wp_newsletter.ibd").unwrap();
//! let mut inventory = ParentNodeInventory::new();
//! let mut collector = Collector::default();
//! let summary = ts
//!     .walk(&WalkOptions::extract(&schema), &mut inventory, &mut collector)
//!     .unwrap();
//!
//! println!("{} records from {} leaf pages", summary.records, summary.leaf_pages);
//! for (page, record) in &collector.records {
//!     println!("page {}: {}", page, record);
//! }
//! println!("parent nodes: {:?}", inventory.get(ts.name()));
//! ```
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`innodb::page`] | Page number / page type extraction from the FIL header |
//! | [`innodb::page_types`] | Page kind classification (leaf, parent node, other) |
//! | [`innodb::schema`] | Field kinds and record layouts |
//! | [`innodb::record`] | Fixed-width record decoding |
//! | [`innodb::scanner`] | Stride-based leaf page scanning |
//! | [`innodb::tablespace`] | Page-by-page tablespace walking |
//! | [`innodb::inventory`] | Parent-node page inventory |
//! | [`innodb::observer`] | Page-visit callbacks |
//! | [`innodb::datadir`] | Directory-level runs with per-file error isolation |
//! | [`util::fs`] | Tablespace file discovery |
//! | `util::events` | NDJSON run event log (`cli` feature) |
//!
//! [`Schema`]: innodb::schema::Schema

#[cfg(feature = "cli")]
pub mod cli;
pub mod innodb;
pub mod util;

use thiserror::Error;

/// Errors returned by `salvage` operations.
#[derive(Error, Debug)]
pub enum SalvageError {
    /// An I/O error occurred (file open, read, seek, or write failure).
    #[error("I/O error: {0}")]
    Io(String),

    /// Fewer bytes than a page header needs.
    #[error("Truncated page: header needs {needed} bytes, got {actual}")]
    TruncatedPage { needed: usize, actual: usize },

    /// Fewer bytes than the schema's full record width.
    #[error("Buffer exhausted: record needs {needed} bytes, {available} available")]
    BufferExhausted { needed: usize, available: usize },

    /// A parse error occurred (malformed schema text or schema file).
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid argument was supplied (missing directory, bad option, etc.).
    #[error("Invalid argument: {0}")]
    Argument(String),
}
