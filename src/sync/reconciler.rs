// ABOUTME: Schema reconciler - keeps destination tables in step with source tables
// ABOUTME: Strictly additive: creates missing tables and adds missing columns, never drops or retypes

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;

use crate::schema::{ColumnDescriptor, TableDescriptor};
use crate::sqlite::reader::{get_table_columns, table_exists};
use crate::utils::quote_ident;

/// Reconciler makes sure a destination table can hold every source column.
///
/// Schema evolution is forward-only. Existing columns are never dropped,
/// retyped, or given tighter constraints, even if the source changed them.
pub struct Reconciler<'a> {
    conn: &'a Connection,
}

impl<'a> Reconciler<'a> {
    /// Create a new Reconciler for the destination connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create or extend the destination table for `table`.
    ///
    /// A failed `ADD COLUMN` is logged and recorded on the result without
    /// stopping the remaining columns. Failing to inspect the catalog or to
    /// create the table is an error.
    pub fn reconcile(&self, table: &TableDescriptor) -> Result<ReconcileResult> {
        let mut result = ReconcileResult::new(&table.name);

        if !table_exists(self.conn, &table.name)? {
            let sql = create_table_sql(table);
            result.statements_executed += 1;
            self.conn
                .execute_batch(&sql)
                .with_context(|| format!("Failed to create table '{}': {}", table.name, sql))?;
            result.created = true;
            tracing::info!("Created new table '{}' in SQLite", table.name);
            return Ok(result);
        }

        let existing: HashSet<String> = get_table_columns(self.conn, &table.name)?
            .into_iter()
            .map(|c| c.name)
            .collect();

        for column in table
            .columns
            .iter()
            .filter(|c| !existing.contains(&c.name))
        {
            let sql = add_column_sql(&table.name, column);
            result.statements_executed += 1;
            match self.conn.execute_batch(&sql) {
                Ok(()) => {
                    tracing::info!("Added column '{}' to table '{}'", column.name, table.name);
                    result.added_columns.push(column.name.clone());
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to add column '{}' to table '{}': {}",
                        column.name,
                        table.name,
                        e
                    );
                    result
                        .failed_columns
                        .push((column.name.clone(), e.to_string()));
                }
            }
        }

        Ok(result)
    }
}

/// Outcome of reconciling one table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileResult {
    pub table: String,
    /// The table did not exist and was created
    pub created: bool,
    pub added_columns: Vec<String>,
    /// Columns whose `ADD COLUMN` failed, with the error message
    pub failed_columns: Vec<(String, String)>,
    /// DDL statements issued (zero when the schema was already in step)
    pub statements_executed: usize,
}

impl ReconcileResult {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// True when no DDL was needed.
    pub fn is_unchanged(&self) -> bool {
        self.statements_executed == 0
    }
}

/// Build the `CREATE TABLE` statement for a descriptor.
///
/// Generates a statement like:
/// ```sql
/// CREATE TABLE "widgets" ("id" INTEGER NOT NULL PRIMARY KEY, "name" TEXT NOT NULL, "price" REAL)
/// ```
pub fn create_table_sql(table: &TableDescriptor) -> String {
    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let mut def = column_definition(column);
            if table.is_primary_key(column) {
                def.push_str(" PRIMARY KEY");
            }
            def
        })
        .collect();

    format!(
        "CREATE TABLE {} ({})",
        quote_ident(&table.name),
        column_defs.join(", ")
    )
}

/// Build the `ALTER TABLE ... ADD COLUMN` statement for one column.
pub fn add_column_sql(table: &str, column: &ColumnDescriptor) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        quote_ident(table),
        column_definition(column)
    )
}

fn column_definition(column: &ColumnDescriptor) -> String {
    let mut def = format!("{} {}", quote_ident(&column.name), column.storage_class());
    if !column.nullable {
        def.push_str(" NOT NULL");
    }
    def
}
