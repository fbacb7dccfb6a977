// ABOUTME: API key provisioning for replicated members
// ABOUTME: Issues a random UUID key to every member that does not have one yet

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::sqlite::reader::table_exists;

/// Name of the key table in the destination.
pub const API_KEYS_TABLE: &str = "api_keys";

const MEMBERS_TABLE: &str = "members";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS api_keys (
    member_id   INTEGER PRIMARY KEY,
    api_key     TEXT NOT NULL,
    created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Make sure every member has an API key.
///
/// Creates the `api_keys` table if needed, then inserts a fresh UUID v4
/// for each `members` row without a key, all in one transaction. A member
/// whose key cannot be inserted is logged and skipped. Existing keys are
/// never replaced. Returns the number of keys generated; zero when the
/// destination has no `members` table.
pub fn ensure_api_keys(conn: &mut Connection) -> Result<usize> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create api_keys table")?;

    if !table_exists(conn, MEMBERS_TABLE)? {
        tracing::info!("No members table in destination, skipping API key generation");
        return Ok(0);
    }

    tracing::info!("Checking for members without API keys...");

    let tx = conn
        .transaction()
        .context("Failed to start API key transaction")?;

    let member_ids: Vec<i64> = {
        let mut stmt = tx
            .prepare(
                "SELECT m.id
                 FROM members m
                 LEFT JOIN api_keys a ON m.id = a.member_id
                 WHERE a.api_key IS NULL",
            )
            .context("Failed to query members without API keys")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .context("Failed to query members without API keys")?;

        let mut member_ids = Vec::new();
        for id in ids {
            match id {
                Ok(id) => member_ids.push(id),
                Err(e) => tracing::warn!("Failed to read member id: {}", e),
            }
        }
        member_ids
    };

    let mut generated = 0;
    {
        let mut insert = tx
            .prepare("INSERT INTO api_keys (member_id, api_key) VALUES (?1, ?2)")
            .context("Failed to prepare API key insert")?;

        for member_id in member_ids {
            let api_key = uuid::Uuid::new_v4().to_string();
            match insert.execute(params![member_id, api_key]) {
                Ok(_) => generated += 1,
                Err(e) => {
                    tracing::warn!("Failed to insert API key for member {}: {}", member_id, e)
                }
            }
        }
    }

    tx.commit().context("Failed to commit API keys")?;

    tracing::info!("Generated {} new API keys", generated);
    Ok(generated)
}
