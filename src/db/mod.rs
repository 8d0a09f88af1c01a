//! Database initialization and key-value persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup uses this module to create the shared SQLx pool and enforce schema
//! migrations before accepting API traffic. All application state is stored
//! as JSON-serialized values in a flat `kv` table under fixed key names; the
//! service modules own which keys exist and what their payloads mean.

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use time::OffsetDateTime;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Fixed key for the persisted chat list.
pub const KEY_CHATS: &str = "chats";
/// Fixed key for the currently selected chat id.
pub const KEY_CURRENT_CHAT: &str = "current-chat";
/// Fixed key for the installed-model mirror.
pub const KEY_MODELS: &str = "models";
/// Fixed key for the settings blob.
pub const KEY_SETTINGS: &str = "settings";
/// Fixed key for cached reference documents.
pub const KEY_MEMORY_DOCS: &str = "memory-docs";

fn db_max_connections() -> u32 {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
}

/// Initialize the `SQLite` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(db_max_connections())
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// Read one kv entry, parsed as JSON. A missing key or an unparsable stored
/// value both read as `None`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn kv_get(pool: &SqlitePool, key: &str) -> Result<Option<serde_json::Value>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv WHERE key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.and_then(|(raw,)| serde_json::from_str(&raw).ok()))
}

/// Write one kv entry, replacing any previous value for the key.
///
/// # Errors
///
/// Returns an error if the upsert fails.
pub async fn kv_put(pool: &SqlitePool, key: &str, value: &serde_json::Value) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO kv (key, value, updated_at) VALUES ($1, $2, $3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value.to_string())
    .bind(OffsetDateTime::now_utc().unix_timestamp())
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete one kv entry. Removing an absent key is a no-op.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub async fn kv_delete(pool: &SqlitePool, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM kv WHERE key = $1")
        .bind(key)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// In-memory pool for tests. One connection, so every query sees the same
    /// database.
    pub async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite should connect");
        sqlx::migrate!("src/db/migrations")
            .run(&pool)
            .await
            .expect("migrations should run");
        pool
    }
}
