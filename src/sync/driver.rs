// ABOUTME: SyncDriver - runs one full pass over every source table
// ABOUTME: Per-table failures are recorded in the report and never stop the run

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use std::time::Instant;

use super::reconciler::Reconciler;
use super::state::{ensure_state_table, load_state, save_state, SyncState, SYNC_METADATA_TABLE};
use super::table::{sync_table, TableSyncOutcome};
use crate::api_keys::API_KEYS_TABLE;
use crate::schema::describe_table;
use crate::source::SourceDatabase;
use crate::sqlite::reader::get_table_row_count;

/// Step of a table's sync at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Introspect,
    Reconcile,
    LoadState,
    Sync,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStage::Introspect => "introspect",
            SyncStage::Reconcile => "reconcile",
            SyncStage::LoadState => "load state",
            SyncStage::Sync => "sync",
        };
        f.write_str(name)
    }
}

/// Final status of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableStatus {
    Synced { rows_written: u64, rows_failed: u64 },
    Skipped { row_count: u64 },
    Failed { stage: SyncStage, error: String },
}

/// Result of syncing one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub status: TableStatus,
    /// Columns added to the destination table during this run
    pub added_columns: Vec<String>,
    /// Non-fatal problems (fallback key, failed column additions, state not saved)
    pub warnings: Vec<String>,
}

impl TableReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            status: TableStatus::Skipped { row_count: 0 },
            added_columns: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn failed(mut self, stage: SyncStage, error: anyhow::Error) -> Self {
        tracing::error!("Failed to {} table '{}': {:?}", stage, self.table, error);
        self.status = TableStatus::Failed {
            stage,
            error: format!("{:#}", error),
        };
        self
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, TableStatus::Failed { .. })
    }
}

/// Statistics from a sync run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn tables_synced(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Synced { .. }))
    }

    pub fn tables_skipped(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Skipped { .. }))
    }

    pub fn tables_failed(&self) -> usize {
        self.count(|s| matches!(s, TableStatus::Failed { .. }))
    }

    /// Total rows upserted across all tables.
    pub fn rows_written(&self) -> u64 {
        self.tables
            .iter()
            .map(|t| match t.status {
                TableStatus::Synced { rows_written, .. } => rows_written,
                _ => 0,
            })
            .sum()
    }

    /// Check if every table completed without failing.
    pub fn is_success(&self) -> bool {
        self.tables_failed() == 0
    }

    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    fn count(&self, predicate: impl Fn(&TableStatus) -> bool) -> usize {
        self.tables.iter().filter(|t| predicate(&t.status)).count()
    }
}

/// Run context for one sync pass.
///
/// Holds the source and destination handles and accumulates a report
/// entry per table. Tables are processed one at a time in the order the
/// source lists them, each in its own destination transaction, so a
/// failure in one table never undoes another.
pub struct SyncDriver<'a, S: ?Sized> {
    source: &'a mut S,
    destination: &'a mut Connection,
    report: SyncReport,
}

impl<'a, S> SyncDriver<'a, S>
where
    S: SourceDatabase + ?Sized,
{
    pub fn new(source: &'a mut S, destination: &'a mut Connection) -> Self {
        Self {
            source,
            destination,
            report: SyncReport::default(),
        }
    }

    /// Sync every source table and return the report.
    ///
    /// Only failing to prepare the sync metadata table or to list the
    /// source tables is an error; everything else is recorded per table.
    pub async fn run(mut self) -> Result<SyncReport> {
        let start = Instant::now();

        ensure_state_table(self.destination)?;

        let tables = self
            .source
            .list_tables()
            .await
            .context("Failed to get table list from source")?;
        tracing::info!("Found {} tables to sync", tables.len());

        for table in &tables {
            tracing::info!("Processing table: {}", table);
            let report = self.sync_one(table).await;
            self.report.tables.push(report);
        }

        self.report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(self.report)
    }

    async fn sync_one(&mut self, table: &str) -> TableReport {
        let mut report = TableReport::new(table);

        if is_reserved_table(table) {
            return report.failed(
                SyncStage::Reconcile,
                anyhow!("table name '{}' is reserved for sync bookkeeping", table),
            );
        }

        let descriptor = match describe_table(&mut *self.source, table).await {
            Ok(descriptor) => descriptor,
            Err(e) => return report.failed(SyncStage::Introspect, e),
        };
        if descriptor.primary_key_is_fallback {
            report.warnings.push(format!(
                "no primary key declared, using first column '{}' as key",
                descriptor.primary_key
            ));
        }

        match Reconciler::new(self.destination).reconcile(&descriptor) {
            Ok(result) => {
                report.added_columns = result.added_columns;
                for (column, error) in result.failed_columns {
                    report
                        .warnings
                        .push(format!("failed to add column '{}': {}", column, error));
                }
            }
            Err(e) => return report.failed(SyncStage::Reconcile, e),
        }

        let prior = match load_state(self.destination, table) {
            Ok(prior) => prior,
            Err(e) => return report.failed(SyncStage::LoadState, e),
        };

        let outcome = match sync_table(
            &mut *self.source,
            self.destination,
            &descriptor,
            prior.as_ref(),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => return report.failed(SyncStage::Sync, e),
        };

        // The state is refreshed on skips too, so the timestamp always
        // reflects the last completed pass.
        let row_count = match get_table_row_count(self.destination, table) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to count destination rows for '{}': {:#}", table, e);
                i64::try_from(outcome.observed_row_count()).unwrap_or(i64::MAX)
            }
        };
        if let Err(e) = save_state(self.destination, table, &SyncState::now(row_count)) {
            tracing::error!("Failed to update sync metadata for '{}': {:#}", table, e);
            report
                .warnings
                .push(format!("sync state not saved: {:#}", e));
        }

        report.status = match outcome {
            TableSyncOutcome::Synced {
                rows_written,
                rows_failed,
                ..
            } => TableStatus::Synced {
                rows_written,
                rows_failed,
            },
            TableSyncOutcome::Skipped { row_count } => TableStatus::Skipped { row_count },
        };
        report
    }
}

/// Destination tables owned by the replicator itself.
fn is_reserved_table(table: &str) -> bool {
    table.eq_ignore_ascii_case(SYNC_METADATA_TABLE) || table.eq_ignore_ascii_case(API_KEYS_TABLE)
}
