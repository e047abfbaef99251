//! Configuration resolution for marquee-resolver
//!
//! Provides multi-tier OMDb API key resolution with Database → ENV → TOML
//! priority, plus search cache sizing from the TOML config.

use marquee_common::config::TomlConfig;
use marquee_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::time::Duration;
use tracing::{info, warn};

use crate::services::search_cache;

/// Environment variable naming the OMDb API key
pub const OMDB_API_KEY_ENV: &str = "MARQUEE_OMDB_API_KEY";

/// Resolve OMDb API key from 3-tier configuration
///
/// **Priority:** Database → ENV → TOML
pub async fn resolve_omdb_api_key(db: &Pool<Sqlite>, toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();

    // Tier 1: Database (authoritative)
    let db_key = crate::db::settings::get_omdb_api_key(db).await?;
    if let Some(key) = &db_key {
        if is_valid_key(key) {
            sources.push("database");
        }
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(OMDB_API_KEY_ENV).ok();
    if let Some(key) = &env_key {
        if is_valid_key(key) {
            sources.push("environment");
        }
    }

    // Tier 3: TOML config
    let toml_key = toml_config.omdb_api_key.as_ref();
    if let Some(key) = toml_key {
        if is_valid_key(key) {
            sources.push("TOML");
        }
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "OMDb API key found in multiple sources: {}. Using database (highest priority).",
            sources.join(", ")
        );
    }

    // Resolution priority
    if let Some(key) = db_key {
        if is_valid_key(&key) {
            info!("OMDb API key loaded from database");
            return Ok(key);
        }
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            info!("OMDb API key loaded from environment variable");
            return Ok(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            info!("OMDb API key loaded from TOML config");
            return Ok(key.clone());
        }
    }

    Err(Error::Config(format!(
        "OMDb API key not configured. Please configure using one of:\n\
         - settings table key 'omdb_api_key'\n\
         - environment variable {}\n\
         - config file key 'omdb_api_key'",
        OMDB_API_KEY_ENV
    )))
}

/// Search cache sizing from TOML, with compiled defaults
pub fn search_cache_settings(toml_config: &TomlConfig) -> (usize, Duration) {
    let capacity = toml_config
        .search_cache_capacity
        .unwrap_or(search_cache::DEFAULT_CAPACITY);
    let ttl = toml_config
        .search_cache_ttl_seconds
        .map(Duration::from_secs)
        .unwrap_or(search_cache::DEFAULT_TTL);

    (capacity, ttl)
}

fn is_valid_key(key: &str) -> bool {
    let trimmed = key.trim();
    !trimmed.is_empty() && !trimmed.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use sqlx::SqlitePool;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        marquee_common::db::init::create_settings_table(&pool)
            .await
            .unwrap();
        pool
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abcd1234"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
        assert!(!is_valid_key("has space"));
    }

    #[test]
    fn test_search_cache_settings_defaults() {
        let (capacity, ttl) = search_cache_settings(&TomlConfig::default());
        assert_eq!(capacity, search_cache::DEFAULT_CAPACITY);
        assert_eq!(ttl, search_cache::DEFAULT_TTL);
    }

    #[test]
    fn test_search_cache_settings_from_toml() {
        let config = TomlConfig {
            search_cache_capacity: Some(16),
            search_cache_ttl_seconds: Some(60),
            ..Default::default()
        };
        let (capacity, ttl) = search_cache_settings(&config);
        assert_eq!(capacity, 16);
        assert_eq!(ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    #[serial]
    async fn test_database_key_wins_over_toml() {
        std::env::remove_var(OMDB_API_KEY_ENV);
        let pool = setup_test_db().await;

        crate::db::settings::set_omdb_api_key(&pool, "db-key".to_string())
            .await
            .unwrap();
        let config = TomlConfig {
            omdb_api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        let key = resolve_omdb_api_key(&pool, &config).await.unwrap();
        assert_eq!(key, "db-key");
    }

    #[tokio::test]
    #[serial]
    async fn test_env_key_wins_over_toml() {
        std::env::set_var(OMDB_API_KEY_ENV, "env-key");
        let pool = setup_test_db().await;

        let config = TomlConfig {
            omdb_api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        let key = resolve_omdb_api_key(&pool, &config).await.unwrap();
        assert_eq!(key, "env-key");

        std::env::remove_var(OMDB_API_KEY_ENV);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_key_is_a_config_error() {
        std::env::remove_var(OMDB_API_KEY_ENV);
        let pool = setup_test_db().await;

        let err = resolve_omdb_api_key(&pool, &TomlConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
