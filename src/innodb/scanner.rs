//! Stride-based leaf page scanning.
//!
//! The record region of a leaf page is assumed to start after the 38-byte FIL
//! header plus an estimated 32-byte page directory (offset 70) and to run to
//! the end of the page. [`LeafScanner`] steps through it in fixed 400-byte
//! strides and decodes one record at the start of each stride.
//!
//! This is an approximation: the page's real slot directory and record
//! chain are never consulted, so record boundaries drift for rows whose
//! serialized size differs from the stride. Both constants are kept as-is.
//!
//! Each decode window spans the schema width from the stride start, clipped
//! to the page buffer. A window shorter than the schema width ends the scan.
//!
//! A schema wider than the stride (the 771-byte `wp_newsletter` layout, for
//! one) yields overlapping windows: its trailing fields are decoded from the
//! bytes of the following slot.

use serde::Serialize;

use crate::innodb::constants::{RECORD_REGION_START, RECORD_STRIDE};
use crate::innodb::page::Page;
use crate::innodb::record::{decode_record, Record};
use crate::innodb::schema::Schema;
use crate::SalvageError;

/// Where the record region starts and how far each slot advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanLayout {
    /// Byte offset of the first slot within the page.
    pub record_start: usize,
    /// Distance between consecutive slot starts. Must be non-zero.
    pub stride: usize,
}

impl Default for ScanLayout {
    fn default() -> Self {
        ScanLayout {
            record_start: RECORD_REGION_START,
            stride: RECORD_STRIDE,
        }
    }
}

impl ScanLayout {
    /// Build a layout, rejecting a zero stride.
    pub fn new(record_start: usize, stride: usize) -> Result<Self, SalvageError> {
        if stride == 0 {
            return Err(SalvageError::Argument(
                "Record stride must be greater than zero".to_string(),
            ));
        }
        Ok(ScanLayout {
            record_start,
            stride,
        })
    }
}

/// Lazy iterator over the records of one leaf page.
///
/// Finite: it ends when the region is exhausted or a slot window is shorter
/// than the schema width. Calling [`scan`] again restarts from the first slot.
///
/// Windows are never cut at the next slot, so when `schema.width()` exceeds
/// the stride the trailing fields of a record read into the following slot.
pub struct LeafScanner<'a> {
    data: &'a [u8],
    schema: &'a Schema,
    stride: usize,
    offset: usize,
    done: bool,
}

impl<'a> LeafScanner<'a> {
    /// Scan raw page bytes directly, without header parsing.
    pub fn new(data: &'a [u8], schema: &'a Schema, layout: &ScanLayout) -> Self {
        LeafScanner {
            data,
            schema,
            // a zero stride would never advance
            stride: layout.stride.max(1),
            offset: layout.record_start,
            done: false,
        }
    }

    /// Byte offset of the next slot to decode.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for LeafScanner<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.done || self.offset >= self.data.len() {
            self.done = true;
            return None;
        }

        let end = self
            .offset
            .saturating_add(self.schema.width())
            .min(self.data.len());
        match decode_record(&self.data[self.offset..end], self.schema) {
            Ok(record) => {
                self.offset = self.offset.saturating_add(self.stride);
                Some(record)
            }
            Err(_) => {
                // BufferExhausted: the tail of the page cannot hold a full record
                self.done = true;
                None
            }
        }
    }
}

/// Scan a leaf page's record region.
///
/// The page's kind is not checked; callers route only leaf pages here.
///
/// # Examples
///
/// ```
/// use salvage::innodb::page::Page;
/// use salvage::innodb::scanner::{scan, ScanLayout};
/// use salvage::innodb::schema::Schema;
///
/// let mut data = vec![0u8; 16384];
/// data[24..26].copy_from_slice(&17855u16.to_be_bytes());
/// data[70..74].copy_from_slice(&42u32.to_be_bytes());
///
/// let schema = Schema::parse("id:int,email:string").unwrap();
/// let page = Page::parse(&data).unwrap();
/// let first = scan(&page, &schema, &ScanLayout::default()).next().unwrap();
/// assert_eq!(first.get("id").unwrap().to_string(), "42");
/// ```
pub fn scan<'a>(page: &Page<'a>, schema: &'a Schema, layout: &ScanLayout) -> LeafScanner<'a> {
    LeafScanner::new(page.data(), schema, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innodb::constants::*;
    use crate::innodb::record::FieldValue;
    use byteorder::{BigEndian, ByteOrder};

    fn leaf_page() -> Vec<u8> {
        let mut data = vec![0u8; SIZE_PAGE];
        BigEndian::write_u16(&mut data[FIL_PAGE_TYPE..], FIL_PAGE_INDEX);
        data
    }

    fn small_schema() -> Schema {
        Schema::parse("id:int,active:bool,email:string").unwrap()
    }

    #[test]
    fn test_default_layout() {
        let layout = ScanLayout::default();
        assert_eq!(layout.record_start, 70);
        assert_eq!(layout.stride, 400);
    }

    #[test]
    fn test_layout_rejects_zero_stride() {
        assert!(ScanLayout::new(70, 0).is_err());
        assert!(ScanLayout::new(0, 1).is_ok());
    }

    #[test]
    fn test_zero_page_yields_empty_records() {
        let data = leaf_page();
        let schema = small_schema();
        let page = Page::parse(&data).unwrap();
        let records: Vec<Record> = scan(&page, &schema, &ScanLayout::default()).collect();

        // slots at 70, 470, ..., 16070; the last has 314 bytes >= 260
        assert_eq!(records.len(), 41);
        for rec in &records {
            assert_eq!(rec.get("id"), Some(&FieldValue::Int(0)));
            assert_eq!(rec.get("active"), Some(&FieldValue::Bool(false)));
            assert_eq!(rec.get("email"), Some(&FieldValue::Str(String::new())));
        }
    }

    #[test]
    fn test_wide_schema_stops_at_short_tail() {
        let data = leaf_page();
        let schema = Schema::wp_newsletter(); // 771 bytes
        let records = LeafScanner::new(&data, &schema, &ScanLayout::default()).count();
        // last slot start s must satisfy s + 771 <= 16384
        let expected = (SIZE_PAGE - 771 - RECORD_REGION_START) / RECORD_STRIDE + 1;
        assert_eq!(records, expected);
    }

    #[test]
    fn test_wide_schema_reads_into_next_slot() {
        let mut data = leaf_page();
        let next_email = RECORD_REGION_START + RECORD_STRIDE + FIELD_INT_LEN;
        data[next_email..next_email + 2].copy_from_slice(b"Bo");
        let schema = Schema::wp_newsletter();
        let records: Vec<Record> =
            LeafScanner::new(&data, &schema, &ScanLayout::default()).take(2).collect();

        // slot 1's email starts 143 bytes into slot 0's profile_1
        let expected = format!("{}Bo", "\0".repeat(143));
        assert_eq!(records[0].get("profile_1"), Some(&FieldValue::Str(expected)));
        assert_eq!(records[1].get("email"), Some(&FieldValue::Str("Bo".to_string())));
    }

    #[test]
    fn test_slots_follow_stride() {
        let mut data = leaf_page();
        BigEndian::write_u32(&mut data[RECORD_REGION_START..], 1);
        BigEndian::write_u32(&mut data[RECORD_REGION_START + RECORD_STRIDE..], 2);
        BigEndian::write_u32(&mut data[RECORD_REGION_START + 2 * RECORD_STRIDE..], 3);
        let schema = small_schema();
        let ids: Vec<FieldValue> = LeafScanner::new(&data, &schema, &ScanLayout::default())
            .take(4)
            .filter_map(|r| r.get("id").cloned())
            .collect();
        assert_eq!(
            ids,
            vec![
                FieldValue::Int(1),
                FieldValue::Int(2),
                FieldValue::Int(3),
                FieldValue::Int(0)
            ]
        );
    }

    #[test]
    fn test_scan_is_restartable() {
        let mut data = leaf_page();
        BigEndian::write_u32(&mut data[RECORD_REGION_START..], 77);
        let schema = small_schema();
        let page = Page::parse(&data).unwrap();
        let layout = ScanLayout::default();
        let first: Vec<Record> = scan(&page, &schema, &layout).collect();
        let second: Vec<Record> = scan(&page, &schema, &layout).collect();
        assert_eq!(first, second);
        assert_eq!(first[0].get("id"), Some(&FieldValue::Int(77)));
    }

    #[test]
    fn test_truncated_page_stays_in_bounds() {
        let data = vec![0u8; 500];
        let schema = small_schema();
        let records: Vec<Record> =
            LeafScanner::new(&data, &schema, &ScanLayout::default()).collect();
        // slot at 70 fits (70 + 260 <= 500), slot at 470 does not
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_region_start_past_end_yields_nothing() {
        let data = vec![0u8; 40];
        let schema = small_schema();
        let mut scanner = LeafScanner::new(&data, &schema, &ScanLayout::default());
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_custom_layout() {
        let mut data = vec![0u8; 64];
        BigEndian::write_u32(&mut data[8..], 5);
        BigEndian::write_u32(&mut data[13..], 6);
        let schema = Schema::parse("id:int,f:bool").unwrap();
        let layout = ScanLayout::new(8, 5).unwrap();
        let mut scanner = LeafScanner::new(&data, &schema, &layout);
        assert_eq!(scanner.offset(), 8);
        assert_eq!(scanner.next().unwrap().get("id"), Some(&FieldValue::Int(5)));
        assert_eq!(scanner.offset(), 13);
        assert_eq!(scanner.next().unwrap().get("id"), Some(&FieldValue::Int(6)));
    }
}
