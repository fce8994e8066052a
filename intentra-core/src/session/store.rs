//! Filesystem-backed session buffers
//!
//! Each hook invocation is its own process, so the only state shared between
//! the events of a session lives in two files per [`SessionKey`]:
//!
//! - `intentra_buffer_<suffix>.jsonl`: one [`BufferedEvent`] per line
//! - `intentra_lastscan_<suffix>.txt`: id of the last directly delivered scan
//!
//! Appends are single `write` calls on an `O_APPEND` handle, so concurrent
//! writers interleave whole lines. Finalization claims the buffer by renaming
//! it before reading; a racing append after the rename starts a fresh buffer
//! instead of being lost with the claimed one. No exclusive lock is taken.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::key::SessionKey;
use crate::error::Result;
use crate::hooks::RawEvent;
use crate::types::{Event, Tool};

pub const BUFFER_FILE_PREFIX: &str = "intentra_buffer_";
pub const LAST_SCAN_FILE_PREFIX: &str = "intentra_lastscan_";

/// One buffered line: the normalized event and the payload it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferedEvent {
    pub event: Event,
    pub raw_event: RawEvent,
}

impl BufferedEvent {
    pub fn new(event: Event, raw_event: RawEvent) -> Self {
        Self { event, raw_event }
    }
}

/// Session buffers and last-scan records under one directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn buffer_path(&self, key: &SessionKey) -> PathBuf {
        self.dir
            .join(format!("{BUFFER_FILE_PREFIX}{}.jsonl", key.file_suffix()))
    }

    pub fn last_scan_path(&self, key: &SessionKey) -> PathBuf {
        self.dir
            .join(format!("{LAST_SCAN_FILE_PREFIX}{}.txt", key.file_suffix()))
    }

    /// Apply the claude→cursor rule: a claude event joins an open cursor
    /// session with the same base id, since both tools' hooks fire for the
    /// same editor session when registered together.
    pub fn resolve_key(&self, key: SessionKey) -> SessionKey {
        if key.tool() != Tool::Claude.as_str() {
            return key;
        }
        let cursor_key = key.with_tool(Tool::Cursor.as_str());
        if self.has_buffer(&cursor_key) {
            tracing::debug!(
                base_id = key.base_id(),
                "Retargeting claude event onto cursor session"
            );
            cursor_key
        } else {
            key
        }
    }

    pub fn has_buffer(&self, key: &SessionKey) -> bool {
        self.buffer_path(key).is_file()
    }

    /// Append one event to the session's buffer, creating it if needed.
    pub fn append(&self, key: &SessionKey, entry: &BufferedEvent) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.buffer_path(key))?;
        file.write_all(&line)?;
        Ok(())
    }

    /// Current buffer contents without consuming them.
    pub fn read_buffer(&self, key: &SessionKey) -> Result<Vec<BufferedEvent>> {
        match fs::read_to_string(self.buffer_path(key)) {
            Ok(content) => Ok(parse_lines(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the whole buffer and delete it.
    ///
    /// A missing buffer yields an empty list, so a second drain of the same
    /// key returns nothing.
    pub fn drain(&self, key: &SessionKey) -> Result<Vec<BufferedEvent>> {
        let path = self.buffer_path(key);
        let claimed = path.with_extension(format!("jsonl.claim-{}", uuid::Uuid::new_v4().simple()));

        match fs::rename(&path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let content = fs::read_to_string(&claimed);
        if let Err(e) = fs::remove_file(&claimed) {
            tracing::warn!(
                path = %claimed.display(),
                error = %e,
                "Failed to remove claimed buffer"
            );
        }
        Ok(parse_lines(&content?))
    }

    /// Record the id of a directly delivered scan, replacing any previous one.
    pub fn save_last_scan_id(&self, key: &SessionKey, scan_id: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.last_scan_path(key);
        let tmp = path.with_extension(format!("txt.tmp-{}", std::process::id()));
        fs::write(&tmp, scan_id)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Read and delete the session's last scan id.
    pub fn take_last_scan_id(&self, key: &SessionKey) -> Result<Option<String>> {
        let path = self.last_scan_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let scan_id = content.trim();
        Ok((!scan_id.is_empty()).then(|| scan_id.to_string()))
    }
}

fn parse_lines(content: &str) -> Vec<BufferedEvent> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match serde_json::from_str::<BufferedEvent>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "Skipping malformed buffer line");
                None
            }
        })
        .collect()
}
