//! Local scan archive
//!
//! SQLite storage used in verbose mode:
//! - Schema migrations via `PRAGMA user_version`
//! - Lossless scan JSON next to queryable summary columns

pub mod archive;
pub mod schema;

pub use archive::{ArchivedScan, ScanArchive};
