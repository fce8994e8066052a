//! File logging for hook processes
//!
//! The host tool owns our stdout and stderr, so hooks never log there. In
//! verbose mode each process appends to a daily file under
//! `$XDG_STATE_HOME/intentra/`; otherwise no subscriber is installed and every
//! `tracing` call is a no-op.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LoggingConfig};

/// Prefix of the daily log files (`intentra.log.YYYY-MM-DD`)
pub const LOG_FILE_PREFIX: &str = "intentra.log";

/// Keeps the background writer alive; pending lines are flushed on drop.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Install file logging when verbose mode is on.
///
/// Returns `None` when verbose mode is off.
pub fn init_for_hook(config: &Config) -> crate::error::Result<Option<LoggingGuard>> {
    if !config.is_debug() {
        return Ok(None);
    }
    init(&config.logging, &Config::state_dir()).map(Some)
}

/// Log to a daily-rotated file in `log_dir`.
///
/// The level comes from `RUST_LOG` when set, else from config.
pub fn init(config: &LoggingConfig, log_dir: &Path) -> crate::error::Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // A second init in one process (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::debug!(pid = std::process::id(), log_dir = %log_dir.display(), "Hook logging started");

    Ok(LoggingGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let log_dir = dir.path().join("state").join("intentra");

        let guard = init(&LoggingConfig::default(), &log_dir).unwrap();
        drop(guard);
        assert!(log_dir.is_dir());
    }

    #[test]
    fn test_init_fails_when_log_dir_is_a_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("state");
        std::fs::write(&blocker, "not a directory").unwrap();

        assert!(init(&LoggingConfig::default(), &blocker.join("intentra")).is_err());
    }
}
