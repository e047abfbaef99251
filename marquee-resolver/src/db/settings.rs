//! Settings database operations
//!
//! Get/set accessors for the settings table following the key-value
//! pattern. The OMDb API key stored here is the highest-priority
//! configuration source.

use marquee_common::{Error, Result};
use sqlx::{Pool, Sqlite};

const OMDB_API_KEY: &str = "omdb_api_key";

/// Get OMDb API key from database
///
/// Returns Some(key) if set, None otherwise
pub async fn get_omdb_api_key(db: &Pool<Sqlite>) -> Result<Option<String>> {
    get_setting::<String>(db, OMDB_API_KEY).await
}

/// Set OMDb API key in database
pub async fn set_omdb_api_key(db: &Pool<Sqlite>, key: String) -> Result<()> {
    set_setting(db, OMDB_API_KEY, key).await
}

/// Generic setting getter (internal)
async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(Error::Database)?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting failed: {}", e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Generic setting setter (internal)
async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await
    .map_err(Error::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        marquee_common::db::init::create_settings_table(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_omdb_api_key_returns_none_when_missing() {
        let pool = setup_test_db().await;

        let key = get_omdb_api_key(&pool).await.unwrap();
        assert_eq!(key, None);
    }

    #[tokio::test]
    async fn test_set_then_get_omdb_api_key() {
        let pool = setup_test_db().await;

        set_omdb_api_key(&pool, "test-key-123".to_string()).await.unwrap();

        let key = get_omdb_api_key(&pool).await.unwrap();
        assert_eq!(key, Some("test-key-123".to_string()));
    }

    #[tokio::test]
    async fn test_set_omdb_api_key_updates_existing() {
        let pool = setup_test_db().await;

        set_omdb_api_key(&pool, "old-key".to_string()).await.unwrap();
        set_omdb_api_key(&pool, "new-key".to_string()).await.unwrap();

        let key = get_omdb_api_key(&pool).await.unwrap();
        assert_eq!(key, Some("new-key".to_string()));
    }
}
