// ABOUTME: Table synchronizer - copies one source table into the destination
// ABOUTME: Skips tables whose row count is unchanged since the last sync

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::state::SyncState;
use super::writer::ChangeWriter;
use crate::schema::TableDescriptor;
use crate::source::SourceDatabase;

/// What happened to a table during a sync pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableSyncOutcome {
    /// Rows were read from the source and upserted.
    Synced {
        rows_written: u64,
        rows_failed: u64,
        /// Source row count observed before reading, if it could be counted
        source_rows: Option<u64>,
    },
    /// Row count matched the previous sync, so no rows were read.
    Skipped { row_count: u64 },
}

impl TableSyncOutcome {
    /// Row count to fall back on when the destination cannot be counted.
    pub fn observed_row_count(&self) -> u64 {
        match *self {
            TableSyncOutcome::Synced {
                rows_written,
                source_rows,
                ..
            } => source_rows.unwrap_or(rows_written),
            TableSyncOutcome::Skipped { row_count } => row_count,
        }
    }
}

/// True when the previous sync saw the same, non-zero, number of rows.
///
/// Row count is the only signal: rows rewritten in place without changing
/// the count are not detected.
pub fn is_unchanged(prior: &SyncState, current_count: u64) -> bool {
    u64::try_from(prior.row_count)
        .is_ok_and(|prior_count| prior_count > 0 && prior_count == current_count)
}

/// Synchronize one table from `source` into `destination`.
///
/// Counts the source rows first and returns [`TableSyncOutcome::Skipped`]
/// when `prior` recorded the same count. Otherwise reads every row, in
/// source order, and upserts it in one destination transaction.
///
/// A count failure is logged and forces a full sync. Failing to read the
/// table or to commit the transaction is an error; individual bad rows are not.
pub async fn sync_table<S>(
    source: &mut S,
    destination: &mut Connection,
    table: &TableDescriptor,
    prior: Option<&SyncState>,
) -> Result<TableSyncOutcome>
where
    S: SourceDatabase + ?Sized,
{
    let source_rows = match source.count_rows(&table.name).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(
                "Failed to count rows in source table '{}', performing full sync: {:#}",
                table.name,
                e
            );
            None
        }
    };

    if let (Some(prior), Some(count)) = (prior, source_rows) {
        if is_unchanged(prior, count) {
            tracing::info!(
                "Table '{}': row count unchanged ({} rows), skipping full sync",
                table.name,
                count
            );
            return Ok(TableSyncOutcome::Skipped { row_count: count });
        }
    }

    let columns = table.column_names();
    let rows = source
        .read_rows(&table.name, &columns)
        .await
        .with_context(|| format!("Failed to read rows from source table '{}'", table.name))?;

    let stats = ChangeWriter::new(destination).apply_rows(&table.name, &columns, rows)?;

    tracing::info!(
        "Table '{}': synced {} rows ({} skipped)",
        table.name,
        stats.rows_written,
        stats.rows_failed
    );

    Ok(TableSyncOutcome::Synced {
        rows_written: stats.rows_written,
        rows_failed: stats.rows_failed,
        source_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unchanged() {
        assert!(is_unchanged(&SyncState::now(3), 3));
        assert!(!is_unchanged(&SyncState::now(3), 4));
        // zero never counts as unchanged
        assert!(!is_unchanged(&SyncState::now(0), 0));
        assert!(!is_unchanged(&SyncState::now(-1), 0));
    }

    #[test]
    fn test_observed_row_count() {
        let synced = TableSyncOutcome::Synced {
            rows_written: 2,
            rows_failed: 1,
            source_rows: Some(3),
        };
        assert_eq!(synced.observed_row_count(), 3);

        let uncounted = TableSyncOutcome::Synced {
            rows_written: 2,
            rows_failed: 0,
            source_rows: None,
        };
        assert_eq!(uncounted.observed_row_count(), 2);

        let skipped = TableSyncOutcome::Skipped { row_count: 9 };
        assert_eq!(skipped.observed_row_count(), 9);
    }
}
