//! Parent-node page inventory.
//!
//! Maps a tablespace file name to the page numbers of its internal
//! (parent node) pages, in the order they were encountered. A file only gets
//! an entry once its first parent-node page is seen.

use std::collections::BTreeMap;

use serde::Serialize;

/// File name to ordered parent-node page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParentNodeInventory {
    files: BTreeMap<String, Vec<u32>>,
}

impl ParentNodeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parent-node page number to `file`'s entry.
    pub fn push(&mut self, file: &str, page_number: u32) {
        self.files
            .entry(file.to_string())
            .or_default()
            .push(page_number);
    }

    /// Parent-node page numbers recorded for `file`.
    pub fn get(&self, file: &str) -> Option<&[u32]> {
        self.files.get(file).map(Vec::as_slice)
    }

    /// Iterate entries ordered by file name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.files.iter().map(|(f, p)| (f.as_str(), p.as_slice()))
    }

    /// Number of files with at least one parent-node page.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total parent-node pages across all files.
    pub fn total_pages(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Fold another inventory into this one, appending page lists.
    pub fn merge(&mut self, other: ParentNodeInventory) {
        for (file, pages) in other.files {
            self.files.entry(file).or_default().extend(pages);
        }
    }
}
