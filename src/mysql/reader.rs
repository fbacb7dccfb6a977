// ABOUTME: SourceDatabase implementation backed by a live MySQL connection
// ABOUTME: Uses SHOW TABLES, DESCRIBE, COUNT(*) and full-table SELECTs

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::Row;

use super::converter::row_to_values;
use super::MySqlSource;
use crate::source::{SourceColumn, SourceDatabase, SourceRow};
use crate::utils::quote_mysql_ident;

#[async_trait]
impl SourceDatabase for MySqlSource {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        let tables: Vec<String> = self
            .conn
            .query("SHOW TABLES")
            .await
            .context("Failed to list MySQL tables")?;
        Ok(tables)
    }

    async fn describe_columns(&mut self, table: &str) -> Result<Vec<SourceColumn>> {
        let rows: Vec<Row> = self
            .conn
            .query(format!("DESCRIBE {}", quote_mysql_ident(table)))
            .await
            .with_context(|| format!("Failed to describe MySQL table '{}'", table))?;

        rows.iter()
            .map(|row| -> Result<SourceColumn> {
                Ok(SourceColumn {
                    name: text_field(row, "Field")?,
                    type_name: text_field(row, "Type")?,
                    nullable: text_field(row, "Null")? == "YES",
                    is_primary: text_field(row, "Key")? == "PRI",
                })
            })
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Unexpected DESCRIBE output for table '{}'", table))
    }

    async fn count_rows(&mut self, table: &str) -> Result<u64> {
        let count: Option<u64> = self
            .conn
            .query_first(format!("SELECT COUNT(*) FROM {}", quote_mysql_ident(table)))
            .await
            .with_context(|| format!("Failed to count rows in MySQL table '{}'", table))?;
        Ok(count.unwrap_or(0))
    }

    async fn read_rows(&mut self, table: &str, columns: &[String]) -> Result<Vec<SourceRow>> {
        let projection: Vec<String> = columns.iter().map(|c| quote_mysql_ident(c)).collect();
        let query = format!(
            "SELECT {} FROM {}",
            projection.join(", "),
            quote_mysql_ident(table)
        );
        tracing::debug!("Reading rows: {}", query);

        let rows: Vec<Row> = self
            .conn
            .query(query)
            .await
            .with_context(|| format!("Failed to query MySQL table '{}'", table))?;

        Ok(rows
            .into_iter()
            .map(|row| row_to_values(row, columns.len()))
            .collect())
    }
}

/// Read a DESCRIBE column as text; NULL reads as the empty string.
fn text_field(row: &Row, name: &str) -> Result<String> {
    match row.get_opt::<Option<String>, _>(name) {
        Some(Ok(value)) => Ok(value.unwrap_or_default()),
        Some(Err(e)) => Err(anyhow!("column '{}' is not text: {:?}", name, e)),
        None => Err(anyhow!("missing column '{}'", name)),
    }
}
