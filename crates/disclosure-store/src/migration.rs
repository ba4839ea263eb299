//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            tracing::debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Data requests and grants. AUTOINCREMENT keeps ids ascending and never reused.
        CREATE TABLE data_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            from_pk BLOB NOT NULL,            -- 64 bytes, requester public key
            to_pk BLOB NOT NULL,              -- 64 bytes, data owner public key
            request_data TEXT,                -- base64 sealed field list, sealed for to_pk
            response_data TEXT,               -- base64 sealed payload, sealed for from_pk
            state INTEGER NOT NULL DEFAULT 0, -- 0=AWAIT, 1=ACCEPT, 2=REJECT
            offer_id INTEGER,                 -- set for offer grants only
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        -- Encrypted profile fields, one row per (owner, field)
        CREATE TABLE profile_fields (
            owner BLOB NOT NULL,              -- 64 bytes, owner public key
            field_name TEXT NOT NULL,
            ciphertext TEXT NOT NULL,         -- base64(nonce || AEAD output)
            updated_at INTEGER NOT NULL,
            PRIMARY KEY (owner, field_name)
        );

        CREATE INDEX idx_requests_from_state ON data_requests(from_pk, state);
        CREATE INDEX idx_requests_to_state ON data_requests(to_pk, state);
        CREATE INDEX idx_requests_offer ON data_requests(offer_id);
        "#,
    )?;

    Ok(())
}

/// Get current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
