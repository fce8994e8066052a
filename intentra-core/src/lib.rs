//! # intentra-core
//!
//! Core library for intentra - a hook-driven telemetry agent for AI coding
//! assistants.
//!
//! This library provides:
//! - Per-tool normalization of hook payloads onto one event model
//! - Filesystem session buffers correlating events across processes
//! - Scan aggregation (tokens, cost, MCP usage, file edits, repository)
//! - Best-effort delivery to the scans API or a self-hosted server
//! - Configuration, logging and a local scan archive
//!
//! ## Architecture
//!
//! Every hook call is its own short-lived process:
//! - **Normalize:** one stdin line becomes a unified [`Event`]
//! - **Buffer:** non-terminal events are appended to the session's file
//! - **Finalize:** the tool's terminal event drains the buffer into a [`Scan`]
//! - **Deliver:** the scan is sent once, never blocking the host tool
//!
//! ## Example
//!
//! ```rust,no_run
//! use intentra_core::{Config, HookPipeline};
//!
//! let config = Config::load().unwrap_or_default();
//! let pipeline = HookPipeline::from_config(&config);
//! pipeline
//!     .handle("cursor", "beforeSubmitPrompt", r#"{"conversation_id":"c1"}"#)
//!     .expect("session buffer unavailable");
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::ScanArchive;
pub use delivery::{DeliveryCoordinator, DeliveryOutcome};
pub use error::{Error, Result};
pub use hooks::{NormalizerRegistry, RawEvent};
pub use pipeline::{HookOutcome, HookPipeline};
pub use scanner::ScanBuilder;
pub use session::{SessionKey, SessionStore};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod delivery;
pub mod device;
pub mod error;
pub mod hash;
pub mod hooks;
pub mod logging;
pub mod pipeline;
pub mod scanner;
pub mod session;
pub mod types;
