//! InnoDB page walking and record salvage.
//!
//! The pipeline for one file is: read a 16 KiB page ([`tablespace`]), read
//! its routing header ([`page`]), classify it ([`page_types`]), then either
//! scan it for records ([`scanner`], [`record`]) or add it to the parent-node
//! inventory ([`inventory`]). [`datadir`] repeats that for every matching
//! file under a directory.
//!
//! Start with [`tablespace::Tablespace`] and a [`schema::Schema`].

pub mod constants;
pub mod datadir;
pub mod inventory;
pub mod observer;
pub mod page;
pub mod page_types;
pub mod record;
pub mod scanner;
pub mod schema;
pub mod tablespace;
