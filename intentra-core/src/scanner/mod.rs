//! Scan aggregation
//!
//! Turns the drained event list of a terminated session into one [`Scan`]:
//! token and cost totals, call counts, MCP usage, modified files and
//! repository metadata.
//!
//! [`Scan`]: crate::types::Scan

pub mod builder;
pub mod files;
pub mod mcp_usage;
pub mod pricing;
pub mod repo;

pub use builder::{scan_id, ScanBuilder, MAX_RETAINED_COMPACTIONS};
pub use repo::RepoInfo;
