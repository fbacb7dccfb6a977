// ABOUTME: sync command - one replication pass from MySQL into SQLite
// ABOUTME: Runs the sync driver, provisions API keys, and prints the report

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::api_keys::ensure_api_keys;
use crate::mysql::MySqlSource;
use crate::source::SourceDatabase;
use crate::sqlite::open_sqlite;
use crate::sync::{SyncDriver, SyncReport, TableStatus};

pub struct SyncOptions {
    /// MySQL connection string (`mysql://` URL or Go-style DSN)
    pub source: String,
    /// Path to the destination SQLite file
    pub destination: String,
    /// Print the report as JSON instead of a summary
    pub json: bool,
    pub skip_api_keys: bool,
}

pub async fn run(opts: SyncOptions) -> Result<()> {
    let mut source = MySqlSource::connect(&opts.source).await?;
    let mut destination = open_sqlite(&opts.destination)?;
    tracing::info!("Syncing into SQLite database {}", opts.destination);

    let report = sync_into(&mut source, &mut destination, !opts.skip_api_keys).await;

    if let Err(e) = source.disconnect().await {
        tracing::warn!("{:#}", e);
    }
    let report = report?;

    if opts.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize sync report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

/// Run one sync pass and, if asked, provision API keys afterwards.
///
/// Table failures are part of the returned report. Only a failure to set up
/// the run (metadata table, table list) is an error. API key provisioning
/// failures are logged and ignored.
pub async fn sync_into<S>(
    source: &mut S,
    destination: &mut Connection,
    provision_api_keys: bool,
) -> Result<SyncReport>
where
    S: SourceDatabase + ?Sized,
{
    let report = SyncDriver::new(source, destination).run().await?;

    tracing::info!(
        "Sync completed in {}ms: {} synced, {} skipped, {} failed",
        report.duration_ms,
        report.tables_synced(),
        report.tables_skipped(),
        report.tables_failed()
    );

    if provision_api_keys {
        if let Err(e) = ensure_api_keys(destination) {
            tracing::error!("Failed to ensure API keys: {:#}", e);
        }
    }

    Ok(report)
}

fn print_report(report: &SyncReport) {
    for table in &report.tables {
        match &table.status {
            TableStatus::Synced {
                rows_written,
                rows_failed,
            } => {
                if *rows_failed > 0 {
                    println!(
                        "  {}: synced {} rows ({} rows skipped)",
                        table.table, rows_written, rows_failed
                    );
                } else {
                    println!("  {}: synced {} rows", table.table, rows_written);
                }
            }
            TableStatus::Skipped { row_count } => {
                println!("  {}: unchanged ({} rows)", table.table, row_count);
            }
            TableStatus::Failed { stage, error } => {
                println!("  {}: failed during {}: {}", table.table, stage, error);
            }
        }
        if !table.added_columns.is_empty() {
            println!("      added columns: {}", table.added_columns.join(", "));
        }
        for warning in &table.warnings {
            println!("      warning: {}", warning);
        }
    }

    println!(
        "Sync complete: {} synced, {} unchanged, {} failed, {} rows written in {}ms",
        report.tables_synced(),
        report.tables_skipped(),
        report.tables_failed(),
        report.rows_written(),
        report.duration_ms
    );
}
