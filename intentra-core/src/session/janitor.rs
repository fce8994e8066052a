//! Stale buffer cleanup
//!
//! Sessions that never see their terminal event leave files behind. Every
//! invocation sweeps buffer and last-scan files untouched for longer than the
//! configured TTL; their telemetry is dropped without producing a scan.

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use super::store::{BUFFER_FILE_PREFIX, LAST_SCAN_FILE_PREFIX};

/// Default age after which session files are considered abandoned
pub const DEFAULT_BUFFER_TTL: Duration = Duration::from_secs(30 * 60);

/// Result of a sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Files inspected
    pub scanned: usize,
    /// Files deleted for being stale
    pub removed: usize,
    /// Files that could not be inspected or deleted
    pub failed: usize,
}

/// Delete session files in `dir` last modified more than `max_age` ago.
///
/// Never fails: a sweep problem must not stop the event being handled.
pub fn sweep_stale(dir: &Path, max_age: Duration) -> SweepStats {
    let mut stats = SweepStats::default();
    let now = SystemTime::now();
    let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());

    for prefix in [BUFFER_FILE_PREFIX, LAST_SCAN_FILE_PREFIX] {
        let pattern = format!("{escaped_dir}/{prefix}*");
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Invalid sweep pattern");
                continue;
            }
        };

        for entry in entries {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!(error = %e, "Unreadable entry during sweep");
                    stats.failed += 1;
                    continue;
                }
            };
            stats.scanned += 1;

            let age = fs::metadata(&path)
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or_default());
            match age {
                Ok(age) if age > max_age => match fs::remove_file(&path) {
                    Ok(()) => {
                        tracing::debug!(
                            path = %path.display(),
                            age_secs = age.as_secs(),
                            "Removed stale session file"
                        );
                        stats.removed += 1;
                    }
                    // Lost a race with another invocation's sweep or drain
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to remove stale session file"
                        );
                        stats.failed += 1;
                    }
                },
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Cannot stat session file");
                    stats.failed += 1;
                }
            }
        }
    }

    if stats.removed > 0 {
        tracing::info!(removed = stats.removed, "Swept stale session files");
    }
    stats
}
