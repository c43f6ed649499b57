//! Page header reading.
//!
//! Every InnoDB page begins with a 38-byte FIL header. Salvage only needs
//! two of its fields to route a page: the page number (bytes 4-7) and the
//! page type (bytes 24-25). Checksum, LSN, and the prev/next pointers are
//! not read.

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::innodb::constants::*;
use crate::innodb::page_types::{classify, PageKind};
use crate::SalvageError;

/// Routing fields from the FIL header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageHeader {
    /// Page number within the tablespace. Bytes 4-7.
    pub page_number: u32,
    /// Raw page type code. Bytes 24-25.
    pub page_type: u16,
}

impl PageHeader {
    /// Classify this header's page type.
    pub fn kind(&self) -> PageKind {
        classify(self.page_type)
    }
}

/// Read the page number and page type from the start of a page buffer.
///
/// Fails with [`SalvageError::TruncatedPage`] when fewer than 26 bytes are
/// available.
///
/// # Examples
///
/// ```
/// use salvage::innodb::page::read_header;
///
/// let mut page = vec![0u8; 38];
/// page[4..8].copy_from_slice(&7u32.to_be_bytes());
/// page[24..26].copy_from_slice(&17855u16.to_be_bytes());
///
/// let hdr = read_header(&page).unwrap();
/// assert_eq!(hdr.page_number, 7);
/// assert_eq!(hdr.page_type, 17855);
///
/// assert!(read_header(&page[..25]).is_err());
/// ```
pub fn read_header(data: &[u8]) -> Result<PageHeader, SalvageError> {
    if data.len() < SIZE_ROUTING_HEAD {
        return Err(SalvageError::TruncatedPage {
            needed: SIZE_ROUTING_HEAD,
            actual: data.len(),
        });
    }

    Ok(PageHeader {
        page_number: BigEndian::read_u32(&data[FIL_PAGE_OFFSET..]),
        page_type: BigEndian::read_u16(&data[FIL_PAGE_TYPE..]),
    })
}

/// A page buffer borrowed from the read step, with its header already parsed.
///
/// The buffer is normally exactly [`SIZE_PAGE`] bytes, but shorter buffers are
/// accepted so that truncated input can still be scanned within bounds.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    header: PageHeader,
    data: &'a [u8],
}

impl<'a> Page<'a> {
    /// Parse the header of `data` and wrap it.
    pub fn parse(data: &'a [u8]) -> Result<Self, SalvageError> {
        let header = read_header(data)?;
        Ok(Page { header, data })
    }

    pub fn header(&self) -> PageHeader {
        self.header
    }

    pub fn number(&self) -> u32 {
        self.header.page_number
    }

    pub fn page_type(&self) -> u16 {
        self.header.page_type
    }

    pub fn kind(&self) -> PageKind {
        self.header.kind()
    }

    /// Raw page bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_header_bytes(len: usize, page_num: u32, page_type: u16) -> Vec<u8> {
        let mut buf = vec![0u8; len];
        BigEndian::write_u32(&mut buf[FIL_PAGE_OFFSET..], page_num);
        BigEndian::write_u16(&mut buf[FIL_PAGE_TYPE..], page_type);
        buf
    }

    #[test]
    fn test_read_header_full_page() {
        let data = make_header_bytes(SIZE_PAGE, 0x01020304, 17855);
        let hdr = read_header(&data).unwrap();
        assert_eq!(hdr.page_number, 0x01020304);
        assert_eq!(hdr.page_type, 17855);
        assert_eq!(hdr.kind(), PageKind::LeafRecords);
    }

    #[test]
    fn test_read_header_ignores_other_fields() {
        let mut data = make_header_bytes(SIZE_FIL_HEAD, 9, 17854);
        // checksum, prev/next, LSN and space id are noise to the reader
        for b in &mut data[0..4] {
            *b = 0xFF;
        }
        for b in &mut data[8..24] {
            *b = 0xAB;
        }
        for b in &mut data[26..38] {
            *b = 0xCD;
        }
        let hdr = read_header(&data).unwrap();
        assert_eq!(hdr.page_number, 9);
        assert_eq!(hdr.page_type, 17854);
    }

    #[test]
    fn test_read_header_minimum_length() {
        let data = make_header_bytes(SIZE_ROUTING_HEAD, 3, 8);
        let hdr = read_header(&data).unwrap();
        assert_eq!(hdr.page_number, 3);
        assert_eq!(hdr.page_type, 8);
    }

    #[test]
    fn test_read_header_too_short() {
        let data = vec![0u8; SIZE_ROUTING_HEAD - 1];
        match read_header(&data) {
            Err(SalvageError::TruncatedPage { needed, actual }) => {
                assert_eq!(needed, 26);
                assert_eq!(actual, 25);
            }
            other => panic!("expected TruncatedPage, got {:?}", other),
        }
    }

    #[test]
    fn test_read_header_empty() {
        assert!(matches!(
            read_header(&[]),
            Err(SalvageError::TruncatedPage { actual: 0, .. })
        ));
    }

    #[test]
    fn test_page_parse_exposes_header() {
        let data = make_header_bytes(SIZE_PAGE, 12, 3);
        let page = Page::parse(&data).unwrap();
        assert_eq!(page.number(), 12);
        assert_eq!(page.page_type(), 3);
        assert_eq!(page.kind(), PageKind::Other);
        assert_eq!(page.data().len(), SIZE_PAGE);
    }
}
