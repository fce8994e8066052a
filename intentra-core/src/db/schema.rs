//! Scan archive schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: archived scans
    r#"
    CREATE TABLE IF NOT EXISTS scans (
        id               TEXT PRIMARY KEY,
        tool             TEXT NOT NULL,
        device_id        TEXT NOT NULL,
        conversation_id  TEXT,
        session_id       TEXT,
        model            TEXT,
        started_at       DATETIME NOT NULL,
        ended_at         DATETIME NOT NULL,
        duration_ms      INTEGER NOT NULL,

        llm_call_count   INTEGER NOT NULL,
        tool_call_count  INTEGER NOT NULL,
        total_tokens     INTEGER NOT NULL,
        estimated_cost   REAL NOT NULL,

        -- How the scan left the machine (direct, server, failed, skipped)
        delivery         TEXT NOT NULL,
        archived_at      DATETIME NOT NULL,

        -- Lossless capture
        scan_json        JSON NOT NULL
    );
    "#,
    // Version 2: listing by recency per tool
    r#"
    CREATE INDEX IF NOT EXISTS idx_scans_started_at ON scans(started_at);
    CREATE INDEX IF NOT EXISTS idx_scans_tool ON scans(tool, started_at);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::debug!(version, "Running archive migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
        assert_eq!(MIGRATIONS.len() as i32, SCHEMA_VERSION);
    }

    #[test]
    fn test_scans_table_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let exists: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='scans'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1);
    }
}
