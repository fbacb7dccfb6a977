// ABOUTME: Table and column descriptors built from live source metadata
// ABOUTME: Chooses the primary key, falling back to the first column when none is declared

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::source::SourceDatabase;
use crate::typemap::{map_type, StorageClass};

/// A source column as used for one sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw source type, e.g. `VARCHAR(255)`
    pub source_type: String,
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// SQLite storage class this column is declared with.
    pub fn storage_class(&self) -> StorageClass {
        map_type(&self.source_type)
    }
}

/// Structure of a source table, rebuilt from source metadata on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: String,
    /// True when the source declared no primary key and the first column was used.
    pub primary_key_is_fallback: bool,
}

impl TableDescriptor {
    /// Column names in source order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key(&self, column: &ColumnDescriptor) -> bool {
        column.name == self.primary_key
    }
}

/// Describe `table` from the source's live metadata.
///
/// A column flagged as primary becomes the key. If the source flags
/// none, the first reported column is used and a warning is logged.
///
/// Known limitation: tables with a composite key, or with no natural key,
/// are keyed on a single column, so distinct source rows sharing that
/// column's value overwrite each other in the destination.
pub async fn describe_table<S>(source: &mut S, table: &str) -> Result<TableDescriptor>
where
    S: SourceDatabase + ?Sized,
{
    let source_columns = source
        .describe_columns(table)
        .await
        .with_context(|| format!("Failed to describe columns of table '{}'", table))?;

    if source_columns.is_empty() {
        bail!("Table '{}' reported no columns", table);
    }

    // With a composite key, the last flagged column wins.
    let declared_key = source_columns
        .iter()
        .rev()
        .find(|c| c.is_primary)
        .map(|c| c.name.clone());

    let columns: Vec<ColumnDescriptor> = source_columns
        .into_iter()
        .map(|c| ColumnDescriptor {
            name: c.name,
            source_type: c.type_name,
            nullable: c.nullable,
        })
        .collect();

    let (primary_key, primary_key_is_fallback) = match declared_key {
        Some(key) => (key, false),
        None => {
            let first = columns[0].name.clone();
            tracing::warn!(
                "No primary key found for table '{}', using first column '{}' as key",
                table,
                first
            );
            (first, true)
        }
    };

    Ok(TableDescriptor {
        name: table.to_string(),
        columns,
        primary_key,
        primary_key_is_fallback,
    })
}
