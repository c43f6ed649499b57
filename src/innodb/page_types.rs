//! Page classification.
//!
//! Salvage routes pages on their 2-byte FIL page type (bytes 24-25). Only two
//! codes matter: 17855 (`FIL_PAGE_INDEX`) holds row data and is scanned for
//! records, 17854 (`FIL_PAGE_RTREE`) is treated as an internal B-tree node and
//! only inventoried. Everything else is [`PageKind::Other`].
//!
//! [`type_name`] gives the MySQL source name of common codes for display.

use serde::Serialize;
use std::fmt;

use crate::innodb::constants::{FIL_PAGE_INDEX, FIL_PAGE_RTREE};

/// Semantic page kind derived from the page type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Leaf page holding row records (type 17855).
    LeafRecords,
    /// Internal / parent node page (type 17854).
    ParentNode,
    /// Any other page type.
    Other,
}

impl PageKind {
    /// Short label used in console output.
    pub fn label(self) -> &'static str {
        match self {
            PageKind::LeafRecords => "leaf",
            PageKind::ParentNode => "parent",
            PageKind::Other => "other",
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a raw page type code to a [`PageKind`].
///
/// Unknown codes are a valid classification, never an error.
///
/// # Examples
///
/// ```
/// use salvage::innodb::page_types::{classify, PageKind};
///
/// assert_eq!(classify(17855), PageKind::LeafRecords);
/// assert_eq!(classify(17854), PageKind::ParentNode);
/// assert_eq!(classify(8), PageKind::Other);
/// ```
pub fn classify(page_type: u16) -> PageKind {
    match page_type {
        FIL_PAGE_INDEX => PageKind::LeafRecords,
        FIL_PAGE_RTREE => PageKind::ParentNode,
        _ => PageKind::Other,
    }
}

/// MySQL source name for a page type code (from `fil0fil.h`).
pub fn type_name(page_type: u16) -> &'static str {
    match page_type {
        0 => "ALLOCATED",
        2 => "UNDO_LOG",
        3 => "INODE",
        4 => "IBUF_FREE_LIST",
        5 => "IBUF_BITMAP",
        6 => "SYS",
        7 => "TRX_SYS",
        8 => "FSP_HDR",
        9 => "XDES",
        10 => "BLOB",
        11 => "ZBLOB",
        12 => "ZBLOB2",
        14 => "COMPRESSED",
        15 => "ENCRYPTED",
        18 => "SDI_BLOB",
        22 => "LOB_INDEX",
        23 => "LOB_DATA",
        24 => "LOB_FIRST",
        17853 => "SDI",
        FIL_PAGE_RTREE => "RTREE",
        FIL_PAGE_INDEX => "INDEX",
        _ => "UNKNOWN",
    }
}
