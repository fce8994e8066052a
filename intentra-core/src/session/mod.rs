//! Cross-process session state
//!
//! Correlates the independent hook invocations of one session through files
//! in the buffer directory, and decides per tool when a session ends.

pub mod janitor;
pub mod key;
pub mod store;
pub mod termination;

pub use janitor::{sweep_stale, SweepStats, DEFAULT_BUFFER_TTL};
pub use key::SessionKey;
pub use store::{BufferedEvent, SessionStore};
pub use termination::{policy_for, Disposition, TerminationPolicy};
