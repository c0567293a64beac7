//! Database access: pool initialization and per-table operations

pub mod face_tags;
pub mod persons;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if missing) the SQLite database and initialize the schema.
///
/// Foreign keys are enabled on every pooled connection so the
/// person → face-tag cascade is enforced by SQLite itself.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);

    tracing::debug!(path = %db_path.display(), "connecting to database");
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory pool for tests. One connection keeps every
/// query on the same in-memory database.
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the persons and face_tags tables if they do not exist.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS persons (
            id TEXT PRIMARY KEY,
            given_name TEXT NOT NULL,
            family_name TEXT,
            kinship TEXT,
            birth_date TEXT,
            biography TEXT NOT NULL DEFAULT '',
            recognition_tag TEXT UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS face_tags (
            id TEXT PRIMARY KEY,
            person_id TEXT REFERENCES persons(id) ON DELETE CASCADE,
            crop_path TEXT NOT NULL,
            source_file_id TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("database tables initialized (persons, face_tags)");

    Ok(())
}
