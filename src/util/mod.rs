//! Shared utilities (file discovery, NDJSON event log).

#[cfg(feature = "cli")]
pub mod events;
pub mod fs;
