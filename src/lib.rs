// ABOUTME: Library crate for mysql-sqlite-sync
// ABOUTME: One-way MySQL to SQLite replication with additive schema reconciliation

pub mod api_keys;
pub mod commands;
pub mod mysql;
pub mod schema;
pub mod source;
pub mod sqlite;
pub mod sync;
pub mod typemap;
pub mod utils;
