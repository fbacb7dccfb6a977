// ABOUTME: SQLite destination handling - opening the replica database
// ABOUTME: Exports catalog readers and source-to-destination value conversion

pub mod converter;
pub mod reader;

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the destination SQLite database at `path`.
///
/// The special path `:memory:` opens an in-memory database.
///
/// # Examples
///
/// ```no_run
/// # use mysql_sqlite_sync::sqlite::open_sqlite;
/// # fn example() -> anyhow::Result<()> {
/// let conn = open_sqlite("club.db")?;
/// # Ok(())
/// # }
/// ```
pub fn open_sqlite(path: &str) -> Result<Connection> {
    if path.trim().is_empty() {
        bail!("SQLite destination path cannot be empty");
    }

    if path == ":memory:" {
        return Connection::open_in_memory().context("Failed to open in-memory SQLite database");
    }

    let path = Path::new(path);
    if path.is_dir() {
        bail!("SQLite destination {} is a directory", path.display());
    }

    tracing::debug!("Opening SQLite destination {}", path.display());

    Connection::open(path)
        .with_context(|| format!("Failed to open SQLite database {}", path.display()))
}
