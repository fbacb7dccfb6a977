// ABOUTME: ChangeWriter - applies source rows to a destination SQLite table
// ABOUTME: One transaction per table, INSERT OR REPLACE per row, bad rows are skipped

use anyhow::{Context, Result};
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::source::SourceRow;
use crate::sqlite::converter::to_destination_row;
use crate::utils::quote_ident;

/// Log progress every this many upserted rows.
const PROGRESS_INTERVAL: u64 = 1000;

/// Counts from applying one table's rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplyStats {
    pub rows_written: u64,
    /// Rows that failed to decode or to upsert and were skipped
    pub rows_failed: u64,
}

/// Writes rows into the destination using upserts keyed on the table's primary key.
pub struct ChangeWriter<'a> {
    conn: &'a mut Connection,
}

impl<'a> ChangeWriter<'a> {
    /// Create a new ChangeWriter for the destination connection.
    pub fn new(conn: &'a mut Connection) -> Self {
        Self { conn }
    }

    /// Upsert `rows` into `table` inside a single transaction.
    ///
    /// Each row's values must be in the order of `columns`. A row that
    /// failed to decode, or whose upsert fails, is logged and skipped while
    /// the transaction carries on. The transaction commits once every row
    /// has been tried; if the commit fails, it is rolled back and the
    /// destination table is left as it was before the call.
    pub fn apply_rows(
        &mut self,
        table: &str,
        columns: &[String],
        rows: Vec<SourceRow>,
    ) -> Result<ApplyStats> {
        let query = build_upsert_query(table, columns);
        let mut stats = ApplyStats::default();

        let tx = self
            .conn
            .transaction()
            .with_context(|| format!("Failed to start transaction for table '{}'", table))?;

        {
            let mut stmt = tx
                .prepare(&query)
                .with_context(|| format!("Failed to prepare upsert for table '{}'", table))?;

            for (index, row) in rows.into_iter().enumerate() {
                let values = match row {
                    Ok(values) => to_destination_row(values),
                    Err(e) => {
                        tracing::warn!(
                            "Table '{}': failed to read row {}, skipping: {:#}",
                            table,
                            index + 1,
                            e
                        );
                        stats.rows_failed += 1;
                        continue;
                    }
                };

                if let Err(e) = stmt.execute(params_from_iter(values.iter())) {
                    tracing::warn!(
                        "Table '{}': failed to upsert row {}, skipping: {}",
                        table,
                        index + 1,
                        e
                    );
                    stats.rows_failed += 1;
                    continue;
                }

                stats.rows_written += 1;
                if stats.rows_written % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Table '{}': upserted {} rows so far",
                        table,
                        stats.rows_written
                    );
                }
            }
        }

        // A failed COMMIT leaves the transaction open; dropping it rolls back.
        tx.commit().with_context(|| {
            format!(
                "Failed to commit transaction for table '{}', changes rolled back",
                table
            )
        })?;

        Ok(stats)
    }
}

/// Build the upsert statement for a table.
///
/// Generates a query like:
/// ```sql
/// INSERT OR REPLACE INTO "widgets" ("id", "name", "price") VALUES (?1, ?2, ?3)
/// ```
fn build_upsert_query(table: &str, columns: &[String]) -> String {
    let quoted_columns: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
        quote_ident(table),
        quoted_columns.join(", "),
        placeholders.join(", ")
    )
}
