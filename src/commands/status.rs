// ABOUTME: status command - shows per-table sync state from the destination
// ABOUTME: Reads sync_metadata without modifying the database

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::sqlite::open_sqlite;
use crate::sqlite::reader::table_exists;
use crate::sync::state::{list_states, TableSyncRecord, SYNC_METADATA_TABLE};

pub struct StatusOptions {
    pub destination: String,
    pub json: bool,
}

pub fn run(opts: StatusOptions) -> Result<()> {
    let records = load_records(&opts.destination)?;

    if opts.json {
        let json =
            serde_json::to_string_pretty(&records).context("Failed to serialize sync status")?;
        println!("{}", json);
        return Ok(());
    }

    if records.is_empty() {
        println!("No tables have been synced yet.");
        return Ok(());
    }

    let width = records
        .iter()
        .map(|r| r.table_name.len())
        .max()
        .unwrap_or(0)
        .max("TABLE".len());
    println!("{:<width$}  {:>10}  LAST SYNC", "TABLE", "ROWS", width = width);
    for record in &records {
        let last_sync = record
            .state
            .last_sync_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<width$}  {:>10}  {}",
            record.table_name,
            record.state.row_count,
            last_sync,
            width = width
        );
    }
    Ok(())
}

/// Stored sync state for every table, or nothing if no sync has run yet.
pub fn load_records(destination: &str) -> Result<Vec<TableSyncRecord>> {
    if destination != ":memory:" && !Path::new(destination).exists() {
        bail!("Destination database {} does not exist", destination);
    }

    let conn = open_sqlite(destination)?;
    if !table_exists(&conn, SYNC_METADATA_TABLE)? {
        return Ok(Vec::new());
    }
    list_states(&conn)
}
