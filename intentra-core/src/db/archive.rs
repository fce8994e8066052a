//! Local scan archive
//!
//! In verbose mode every built scan is kept here together with its delivery
//! outcome, so a developer can inspect exactly what was (or was not) sent.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::delivery::DeliveryOutcome;
use crate::error::{Error, Result};
use crate::types::Scan;

/// A scan as stored in the archive
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedScan {
    pub scan: Scan,
    pub delivery: String,
    pub archived_at: DateTime<Utc>,
}

/// SQLite-backed scan archive
pub struct ScanArchive {
    conn: Connection,
}

impl ScanArchive {
    /// Open or create an archive at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        // Concurrent hook processes may archive at the same moment
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self { conn })
    }

    /// Open an in-memory archive (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Run migrations on this archive
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.conn)
    }

    /// Insert a scan, replacing an earlier copy with the same id.
    pub fn save_scan(&self, scan: &Scan, delivery: DeliveryOutcome) -> Result<()> {
        let scan_json = serde_json::to_string(scan)?;
        self.conn.execute(
            r#"
            INSERT INTO scans (
                id, tool, device_id, conversation_id, session_id, model,
                started_at, ended_at, duration_ms,
                llm_call_count, tool_call_count, total_tokens, estimated_cost,
                delivery, archived_at, scan_json
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(id) DO UPDATE SET
                ended_at = excluded.ended_at,
                duration_ms = excluded.duration_ms,
                llm_call_count = excluded.llm_call_count,
                tool_call_count = excluded.tool_call_count,
                total_tokens = excluded.total_tokens,
                estimated_cost = excluded.estimated_cost,
                delivery = excluded.delivery,
                archived_at = excluded.archived_at,
                scan_json = excluded.scan_json
            "#,
            params![
                scan.id,
                scan.tool,
                scan.device_id,
                scan.conversation_id,
                scan.session_id,
                scan.model,
                scan.started_at.to_rfc3339(),
                scan.ended_at.to_rfc3339(),
                scan.duration_ms,
                scan.llm_call_count,
                scan.tool_call_count,
                i64::try_from(scan.total_tokens).unwrap_or(i64::MAX),
                scan.estimated_cost,
                delivery.as_str(),
                Utc::now().to_rfc3339(),
                scan_json,
            ],
        )?;
        Ok(())
    }

    /// Get a scan by id
    pub fn get_scan(&self, id: &str) -> Result<Option<ArchivedScan>> {
        self.conn
            .query_row(
                "SELECT scan_json, delivery, archived_at FROM scans WHERE id = ?",
                [id],
                Self::row_to_parts,
            )
            .optional()?
            .map(Self::parts_to_archived)
            .transpose()
    }

    /// Most recent scans first
    pub fn list_scans(&self, limit: usize) -> Result<Vec<ArchivedScan>> {
        let mut stmt = self.conn.prepare(
            "SELECT scan_json, delivery, archived_at FROM scans ORDER BY started_at DESC LIMIT ?",
        )?;
        let rows = stmt
            .query_map([limit as i64], Self::row_to_parts)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(Self::parts_to_archived).collect()
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM scans", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_parts(row: &Row) -> rusqlite::Result<(String, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }

    fn parts_to_archived(
        (scan_json, delivery, archived_at): (String, String, String),
    ) -> Result<ArchivedScan> {
        let scan: Scan = serde_json::from_str(&scan_json)?;
        let archived_at = DateTime::parse_from_rfc3339(&archived_at)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| Error::Archive(format!("invalid archived_at: {}", e)))?;
        Ok(ArchivedScan {
            scan,
            delivery,
            archived_at,
        })
    }
}
