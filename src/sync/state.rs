// ABOUTME: Per-table sync state persisted in the destination's sync_metadata table
// ABOUTME: Stores last sync time and last observed row count for change detection

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Name of the bookkeeping table in the destination.
pub const SYNC_METADATA_TABLE: &str = "sync_metadata";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sync_metadata (
    table_name      TEXT PRIMARY KEY,
    last_sync_time  TIMESTAMP,
    row_count       INTEGER
);
"#;

/// Sync state for a single table.
///
/// This is a change-detection heuristic rather than a watermark: a table is
/// only skipped when its row count has not moved since the last sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    /// When the table was last synced. `None` if the stored value is missing or unreadable.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Row count observed at the last sync
    pub row_count: i64,
}

impl SyncState {
    /// State stamped with the current time.
    pub fn now(row_count: i64) -> Self {
        Self {
            last_sync_time: Some(Utc::now()),
            row_count,
        }
    }
}

/// A stored state together with the table it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSyncRecord {
    pub table_name: String,
    #[serde(flatten)]
    pub state: SyncState,
}

/// Create the sync metadata table if it does not exist yet.
pub fn ensure_state_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create sync metadata table")?;
    Ok(())
}

/// Load the state for `table`, or `None` if it has never been synced.
pub fn load_state(conn: &Connection, table: &str) -> Result<Option<SyncState>> {
    conn.query_row(
        "SELECT last_sync_time, row_count FROM sync_metadata WHERE table_name = ?1",
        [table],
        |row| {
            let last_sync_time: Option<String> = row.get(0)?;
            let row_count: Option<i64> = row.get(1)?;
            Ok(SyncState {
                last_sync_time: last_sync_time.as_deref().and_then(parse_sync_time),
                row_count: row_count.unwrap_or(0),
            })
        },
    )
    .optional()
    .with_context(|| format!("Failed to read sync state for table '{}'", table))
}

/// Store the state for `table`, replacing any previous state.
pub fn save_state(conn: &Connection, table: &str, state: &SyncState) -> Result<()> {
    let last_sync_time = state.last_sync_time.map(|t| t.to_rfc3339());
    conn.execute(
        "INSERT INTO sync_metadata (table_name, last_sync_time, row_count)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(table_name) DO UPDATE SET
            last_sync_time = excluded.last_sync_time,
            row_count = excluded.row_count",
        params![table, last_sync_time, state.row_count],
    )
    .with_context(|| format!("Failed to write sync state for table '{}'", table))?;
    Ok(())
}

/// All stored states, ordered by table name.
pub fn list_states(conn: &Connection) -> Result<Vec<TableSyncRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT table_name, last_sync_time, row_count
             FROM sync_metadata
             ORDER BY table_name",
        )
        .context("Failed to prepare sync metadata query")?;

    let records = stmt
        .query_map([], |row| {
            let last_sync_time: Option<String> = row.get(1)?;
            let row_count: Option<i64> = row.get(2)?;
            Ok(TableSyncRecord {
                table_name: row.get(0)?,
                state: SyncState {
                    last_sync_time: last_sync_time.as_deref().and_then(parse_sync_time),
                    row_count: row_count.unwrap_or(0),
                },
            })
        })
        .context("Failed to query sync metadata")?
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read sync metadata")?;

    Ok(records)
}

/// Parse a stored timestamp: RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` (taken as UTC).
fn parse_sync_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
