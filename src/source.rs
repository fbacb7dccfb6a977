// ABOUTME: Source database abstraction consumed by the synchronizer
// ABOUTME: Lists tables, describes columns, counts rows, and reads full tables

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::types::Value;

/// Column metadata exactly as the source reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceColumn {
    pub name: String,
    /// Raw type string, e.g. `varchar(255)`
    pub type_name: String,
    pub nullable: bool,
    pub is_primary: bool,
}

impl SourceColumn {
    pub fn new(name: &str, type_name: &str, nullable: bool, is_primary: bool) -> Self {
        Self {
            name: name.to_string(),
            type_name: type_name.to_string(),
            nullable,
            is_primary,
        }
    }
}

/// A single source row, or the error that prevented it from being decoded.
///
/// Values are in the order of the column list passed to
/// [`SourceDatabase::read_rows`]. Binary payloads are surfaced as
/// [`Value::Blob`]; the synchronizer decides how to store them.
pub type SourceRow = Result<Vec<Value>>;

/// Query surface the synchronizer needs from a source database.
///
/// Calls are issued strictly one after another; implementations do not need
/// to support concurrent use.
#[async_trait]
pub trait SourceDatabase: Send {
    /// All user tables, in the order they should be synchronized.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Columns of `table` in their declared order.
    async fn describe_columns(&mut self, table: &str) -> Result<Vec<SourceColumn>>;

    /// Current number of rows in `table`.
    async fn count_rows(&mut self, table: &str) -> Result<u64>;

    /// Every row of `table`, projected onto `columns`.
    ///
    /// An outer error means the table could not be read at all. Errors for
    /// individual rows are returned in place so the caller can skip them.
    async fn read_rows(&mut self, table: &str, columns: &[String]) -> Result<Vec<SourceRow>>;
}
