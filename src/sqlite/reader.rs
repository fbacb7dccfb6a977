// ABOUTME: SQLite catalog introspection for the destination database
// ABOUTME: Functions to check table existence, list columns, and count rows

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

use crate::utils::quote_ident;

/// Column as declared in the destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Check whether a table named `table` exists in the destination.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |_| Ok(()),
        )
        .optional()
        .with_context(|| format!("Failed to check if table '{}' exists", table))?;

    Ok(found.is_some())
}

/// Columns of `table` in declaration order.
///
/// Returns an empty vector for a table that does not exist.
pub fn get_table_columns(conn: &Connection, table: &str) -> Result<Vec<DestinationColumn>> {
    let mut stmt = conn
        .prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")
        .context("Failed to prepare statement to list columns")?;

    let columns = stmt
        .query_map([table], |row| {
            Ok(DestinationColumn {
                name: row.get(0)?,
                declared_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                primary_key: row.get::<_, i64>(3)? != 0,
            })
        })
        .with_context(|| format!("Failed to query columns of table '{}'", table))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read columns of table '{}'", table))?;

    Ok(columns)
}

/// Get row count for a specific table
pub fn get_table_row_count(conn: &Connection, table: &str) -> Result<i64> {
    let query = format!("SELECT COUNT(*) FROM {}", quote_ident(table));

    conn.query_row(&query, [], |row| row.get(0))
        .with_context(|| format!("Failed to count rows in table '{}'", table))
}
