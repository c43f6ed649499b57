//! Page-by-page tablespace walking.
//!
//! [`Tablespace`] reads a `.ibd` file (or an in-memory image) in fixed
//! 16 KiB chunks. A chunk shorter than a full page, including an empty read,
//! ends the walk normally: a trailing partial page is never processed.
//!
//! [`Tablespace::walk`] routes each page on its type code. Leaf pages are
//! scanned for records, parent-node pages are appended to a
//! [`ParentNodeInventory`], and everything else is counted and skipped.
//! Events go to a [`WalkObserver`].

use std::io::{Cursor, ErrorKind, Read};
use std::path::Path;

use serde::Serialize;

use crate::innodb::constants::SIZE_PAGE;
use crate::innodb::inventory::ParentNodeInventory;
use crate::innodb::observer::{PageVisit, WalkObserver};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageKind;
use crate::innodb::scanner::{scan, ScanLayout};
use crate::innodb::schema::Schema;
use crate::SalvageError;

/// A memory-mapped file reader implementing `Read`.
///
/// Wraps a `memmap2::Mmap` with a cursor position so it can stand in for a
/// `File` behind `Box<dyn Read>`.
#[cfg(feature = "cli")]
struct MmapReader {
    mmap: memmap2::Mmap,
    position: usize,
}

#[cfg(feature = "cli")]
impl Read for MmapReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let available = self.mmap.len().saturating_sub(self.position);
        let to_read = buf.len().min(available);
        buf[..to_read].copy_from_slice(&self.mmap[self.position..self.position + to_read]);
        self.position += to_read;
        Ok(to_read)
    }
}

/// Per-file read state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkState {
    /// Waiting for the next chunk.
    Reading,
    /// A full page was just returned.
    PageAvailable,
    /// A short or empty read (or an I/O error) was seen. Terminal.
    EndOfFile,
}

/// What to do with the pages of a walk.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions<'a> {
    /// Schema for leaf page records. `None` walks for the inventory only.
    pub schema: Option<&'a Schema>,
    pub layout: ScanLayout,
}

impl<'a> WalkOptions<'a> {
    /// Decode leaf records with `schema` using the default layout.
    pub fn extract(schema: &'a Schema) -> Self {
        WalkOptions {
            schema: Some(schema),
            layout: ScanLayout::default(),
        }
    }

    /// Classify pages and collect parent nodes without decoding records.
    pub fn inventory_only() -> Self {
        WalkOptions {
            schema: None,
            layout: ScanLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: ScanLayout) -> Self {
        self.layout = layout;
        self
    }
}

/// Counters for one walked file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    pub file: String,
    /// Full pages processed.
    pub pages: u64,
    pub leaf_pages: u64,
    pub parent_pages: u64,
    pub other_pages: u64,
    /// Pages whose header could not be read. Always zero for full pages.
    pub skipped_pages: u64,
    pub records: u64,
    /// Parent-node page numbers in encounter order.
    pub parent_nodes: Vec<u32>,
}

/// An open tablespace file or in-memory tablespace image.
pub struct Tablespace {
    reader: Box<dyn Read>,
    path: String,
    name: String,
    state: WalkState,
    pages_read: u64,
}

impl Tablespace {
    /// Open a tablespace file for buffered reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SalvageError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| SalvageError::Io(format!("Cannot open {}: {}", path.display(), e)))?;
        Ok(Self::init(Box::new(file), path))
    }

    /// Open a tablespace file using memory-mapped I/O.
    ///
    /// # Safety
    ///
    /// The mapped file must not be modified by another process while the
    /// mapping is alive. Salvage works on copies of data directories, not on
    /// files a live server is writing to.
    #[cfg(feature = "cli")]
    pub fn open_mmap<P: AsRef<Path>>(path: P) -> Result<Self, SalvageError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| SalvageError::Io(format!("Cannot open {}: {}", path.display(), e)))?;

        let file_size = file
            .metadata()
            .map_err(|e| SalvageError::Io(format!("Cannot stat {}: {}", path.display(), e)))?
            .len();
        if file_size == 0 {
            // zero-length mappings are rejected by some platforms
            return Ok(Self::init(Box::new(Cursor::new(Vec::new())), path));
        }

        let mmap = unsafe {
            memmap2::Mmap::map(&file)
                .map_err(|e| SalvageError::Io(format!("Cannot mmap {}: {}", path.display(), e)))?
        };

        Ok(Self::init(Box::new(MmapReader { mmap, position: 0 }), path))
    }

    /// Create a tablespace from an in-memory image. `name` identifies it in
    /// the inventory and in observer events.
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Self {
        Self::from_reader(name, Cursor::new(data))
    }

    /// Create a tablespace over any reader.
    pub fn from_reader<R: Read + 'static>(name: &str, reader: R) -> Self {
        Tablespace {
            reader: Box::new(reader),
            path: name.to_string(),
            name: name.to_string(),
            state: WalkState::Reading,
            pages_read: 0,
        }
    }

    fn init(reader: Box<dyn Read>, path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Tablespace {
            reader,
            path: path.display().to_string(),
            name,
            state: WalkState::Reading,
            pages_read: 0,
        }
    }

    /// File name, used as the inventory key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path as given to `open`, used in observer events.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Full pages returned so far.
    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    /// Fill `buf` with the next page. Returns `false` at end of file.
    fn fill_chunk(&mut self, buf: &mut [u8]) -> Result<bool, SalvageError> {
        if self.state == WalkState::EndOfFile {
            return Ok(false);
        }
        self.state = WalkState::Reading;

        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.state = WalkState::EndOfFile;
                    return Err(SalvageError::Io(format!(
                        "Cannot read page {} of {}: {}",
                        self.pages_read, self.path, e
                    )));
                }
            }
        }

        if filled < buf.len() {
            self.state = WalkState::EndOfFile;
            return Ok(false);
        }

        self.state = WalkState::PageAvailable;
        self.pages_read += 1;
        Ok(true)
    }

    /// Read the next full page into a new buffer, or `None` at end of file.
    pub fn next_page(&mut self) -> Result<Option<Vec<u8>>, SalvageError> {
        let mut buf = vec![0u8; SIZE_PAGE];
        if self.fill_chunk(&mut buf)? {
            Ok(Some(buf))
        } else {
            Ok(None)
        }
    }

    /// Iterate over the remaining pages, calling the callback with
    /// `(page_index, page_data)`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use salvage::innodb::page::read_header;
    /// use salvage::innodb::tablespace::Tablespace;
    ///
    /// let mut ts = Tablespace::open("table.ibd").unwrap();
    /// ts.for_each_page(|index, data| {
    ///     let hdr = read_header(data)?;
    ///     println!("#{}: page {} type {}", index, hdr.page_number, hdr.page_type);
    ///     Ok(())
    /// }).unwrap();
    /// ```
    pub fn for_each_page<F>(&mut self, mut callback: F) -> Result<(), SalvageError>
    where
        F: FnMut(u64, &[u8]) -> Result<(), SalvageError>,
    {
        let mut buf = vec![0u8; SIZE_PAGE];
        while self.fill_chunk(&mut buf)? {
            callback(self.pages_read - 1, &buf)?;
        }
        Ok(())
    }

    /// Walk the remaining pages, routing each on its kind.
    ///
    /// Leaf pages are scanned with `opts.schema` (if any); parent-node page
    /// numbers are appended to `inventory` under [`name`](Self::name). Pages
    /// with unreadable headers are reported to the observer and skipped.
    pub fn walk(
        &mut self,
        opts: &WalkOptions<'_>,
        inventory: &mut ParentNodeInventory,
        observer: &mut dyn WalkObserver,
    ) -> Result<WalkSummary, SalvageError> {
        let name = self.name.clone();
        let path = self.path.clone();
        observer.on_file_start(&path)?;

        let mut summary = WalkSummary {
            file: path.clone(),
            ..Default::default()
        };
        let mut buf = vec![0u8; SIZE_PAGE];

        while self.fill_chunk(&mut buf)? {
            let index = summary.pages;
            summary.pages += 1;

            // buf is always SIZE_PAGE long here, so this only fails if the
            // header ever outgrows a page
            let page = match Page::parse(&buf) {
                Ok(p) => p,
                Err(e) => {
                    summary.skipped_pages += 1;
                    observer.on_page_error(&path, index, &e)?;
                    continue;
                }
            };

            let visit = PageVisit {
                index,
                page_number: page.number(),
                page_type: page.page_type(),
                kind: page.kind(),
            };
            observer.on_page(&path, &visit)?;

            match visit.kind {
                PageKind::LeafRecords => {
                    summary.leaf_pages += 1;
                    if let Some(schema) = opts.schema {
                        for record in scan(&page, schema, &opts.layout) {
                            summary.records += 1;
                            observer.on_record(&path, &visit, &record)?;
                        }
                    }
                }
                PageKind::ParentNode => {
                    summary.parent_pages += 1;
                    summary.parent_nodes.push(visit.page_number);
                    inventory.push(&name, visit.page_number);
                    observer.on_parent_node(&path, visit.page_number)?;
                }
                PageKind::Other => summary.other_pages += 1,
            }
        }

        observer.on_file_end(&path, &summary)?;
        Ok(summary)
    }
}
