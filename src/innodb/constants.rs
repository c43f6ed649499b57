//! InnoDB page geometry and the fixed layout assumptions used for salvage.
//!
//! Header offsets follow fil0fil.h. The record-region constants are
//! estimates for a single known table shape, not values read from the page.

// Page size
pub const SIZE_PAGE: usize = 16384;

// FIL Header (38 bytes total)
pub const SIZE_FIL_HEAD: usize = 38;
pub const FIL_PAGE_OFFSET: usize = 4; // 4 bytes - page number
pub const FIL_PAGE_TYPE: usize = 24; // 2 bytes - page type

/// Minimum bytes needed to read page number and page type.
pub const SIZE_ROUTING_HEAD: usize = FIL_PAGE_TYPE + 2;

// Page type codes used for routing
pub const FIL_PAGE_INDEX: u16 = 17855; // leaf / record page
pub const FIL_PAGE_RTREE: u16 = 17854; // internal / parent node page

// Record region estimate: header + 16 two-byte directory slots
pub const SIZE_PAGE_DIRECTORY_EST: usize = 2 * 16;
pub const RECORD_REGION_START: usize = SIZE_FIL_HEAD + SIZE_PAGE_DIRECTORY_EST; // 70
pub const RECORD_STRIDE: usize = 400;

// Field widths
pub const FIELD_INT_LEN: usize = 4;
pub const FIELD_STRING_LEN: usize = 255;
pub const FIELD_BOOL_LEN: usize = 1;
