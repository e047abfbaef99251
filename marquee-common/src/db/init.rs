//! Database schema initialization
//!
//! Creates the tables the resolver service relies on. All statements are
//! idempotent so startup can run them unconditionally.

use crate::Result;
use sqlx::SqlitePool;

/// Initialize the full schema on a freshly opened pool
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_movies_table(pool).await?;
    create_settings_table(pool).await?;

    tracing::info!("Database tables initialized (movies, settings)");

    Ok(())
}

/// Create the movies catalog table
///
/// `movie_name` is intended to be unique within a `guild_id`, but the store
/// does not enforce it; callers check before inserting.
pub async fn create_movies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS movies (
            id TEXT PRIMARY KEY,
            guild_id TEXT NOT NULL,
            movie_name TEXT NOT NULL,
            added_by TEXT NOT NULL,
            runtime_minutes INTEGER NOT NULL,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_movies_guild ON movies(guild_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings key-value table
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
