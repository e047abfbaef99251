//! Movie catalog database operations
//!
//! The persistent store of resolved movie records, scoped per guild.
//! Substring search is case-insensitive and ordered by ascending name
//! length, so an exact short name out-ranks a longer name that merely
//! contains the query. Operations that read and then write (delete by
//! name, replace) run inside a single transaction.

use marquee_common::{Error, Result};
use rand::seq::SliceRandom;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::MovieMetadata;

const SEARCH_SQL: &str = r#"
    SELECT id, movie_name FROM movies
    WHERE guild_id = ? AND LOWER(movie_name) LIKE '%' || LOWER(?) || '%'
    ORDER BY LENGTH(movie_name) ASC
"#;

/// One stored movie record
#[derive(Debug, Clone)]
pub struct MovieRecord {
    pub id: Uuid,
    pub guild_id: String,
    pub movie_name: String,
    pub added_by: String,
    pub runtime_minutes: u32,
    pub metadata: MovieMetadata,
}

impl MovieRecord {
    /// Create a new record with a fresh id
    pub fn new(
        guild_id: &str,
        movie_name: &str,
        added_by: &str,
        runtime_minutes: u32,
        metadata: MovieMetadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id: guild_id.to_string(),
            movie_name: movie_name.to_string(),
            added_by: added_by.to_string(),
            runtime_minutes,
            metadata,
        }
    }
}

/// Outcome of the global metadata cache lookup
#[derive(Debug)]
pub enum MetadataLookup {
    /// Exactly one distinct stored name matched
    Found(MovieMetadata),
    /// Nothing matched
    NotFound,
    /// More than one distinct stored name matched
    Ambiguous(Vec<String>),
}

/// Insert a movie record
///
/// No duplicate check happens here; callers avoid duplicate names within a
/// guild by checking first.
pub async fn add_movie(pool: &SqlitePool, record: &MovieRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO movies (id, guild_id, movie_name, added_by, runtime_minutes, metadata)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(&record.guild_id)
    .bind(&record.movie_name)
    .bind(&record.added_by)
    .bind(record.runtime_minutes as i64)
    .bind(record.metadata.to_json()?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Case-insensitive substring search, shortest names first
pub async fn search_by_name(
    pool: &SqlitePool,
    guild_id: &str,
    query: &str,
) -> Result<Vec<(Uuid, String)>> {
    let rows = sqlx::query(SEARCH_SQL)
        .bind(guild_id)
        .bind(query)
        .fetch_all(pool)
        .await?;

    rows.into_iter()
        .map(|row| {
            let id_str: String = row.get("id");
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("invalid record id {}: {}", id_str, e)))?;
            Ok((id, row.get("movie_name")))
        })
        .collect()
}

/// Names matching a substring search, shortest first
pub async fn search_names(pool: &SqlitePool, guild_id: &str, query: &str) -> Result<Vec<String>> {
    Ok(search_by_name(pool, guild_id, query)
        .await?
        .into_iter()
        .map(|(_, name)| name)
        .collect())
}

/// All names stored for a guild, alphabetical (case-insensitive)
pub async fn list_for_guild(pool: &SqlitePool, guild_id: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT movie_name FROM movies
        WHERE guild_id = ?
        ORDER BY movie_name COLLATE NOCASE
        "#,
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("movie_name")).collect())
}

/// Names with a stored runtime strictly below `max_minutes`, alphabetical
pub async fn movies_below_runtime(
    pool: &SqlitePool,
    guild_id: &str,
    max_minutes: u32,
) -> Result<Vec<String>> {
    let rows = sqlx::query(
        r#"
        SELECT movie_name FROM movies
        WHERE guild_id = ? AND runtime_minutes < ?
        ORDER BY movie_name COLLATE NOCASE
        "#,
    )
    .bind(guild_id)
    .bind(max_minutes as i64)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("movie_name")).collect())
}

/// Pick one stored name uniformly at random
///
/// Selection happens client-side over the fetched name set rather than via
/// engine-specific random ordering.
pub async fn pick_random(pool: &SqlitePool, guild_id: &str) -> Result<String> {
    let names = list_for_guild(pool, guild_id).await?;

    names
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| Error::EmptyCatalog(format!("no movies stored for guild {}", guild_id)))
}

/// Pick one name uniformly at random among those below a runtime bound
pub async fn pick_random_below_runtime(
    pool: &SqlitePool,
    guild_id: &str,
    max_minutes: u32,
) -> Result<String> {
    let names = movies_below_runtime(pool, guild_id, max_minutes).await?;

    names.choose(&mut rand::thread_rng()).cloned().ok_or_else(|| {
        Error::EmptyCatalog(format!(
            "no movies below {} minutes for guild {}",
            max_minutes, guild_id
        ))
    })
}

/// Delete the single record matching `name`
///
/// Runs the substring search and the delete in one transaction. Zero
/// matches is `NotFound`; more than one (the query being a substring of
/// another stored name counts) is `Ambiguous`.
pub async fn delete_by_exact_name(
    pool: &SqlitePool,
    guild_id: &str,
    name: &str,
) -> Result<String> {
    let mut tx = pool.begin().await?;

    let (id, found_name) = require_single_match(&mut tx, guild_id, name).await?;

    sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(found_name)
}

/// Replace the record matching `old_name` with `new_record`, atomically
///
/// Returns the deleted record's canonical name. A failed insert rolls the
/// delete back.
pub async fn replace_movie(
    pool: &SqlitePool,
    guild_id: &str,
    old_name: &str,
    new_record: &MovieRecord,
) -> Result<String> {
    let mut tx = pool.begin().await?;

    let (id, found_name) = require_single_match(&mut tx, guild_id, old_name).await?;

    sqlx::query("DELETE FROM movies WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO movies (id, guild_id, movie_name, added_by, runtime_minutes, metadata)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_record.id.to_string())
    .bind(&new_record.guild_id)
    .bind(&new_record.movie_name)
    .bind(&new_record.added_by)
    .bind(new_record.runtime_minutes as i64)
    .bind(new_record.metadata.to_json()?)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(found_name)
}

/// Bulk wipe, one guild or everything. Test/reset path.
pub async fn delete_all(pool: &SqlitePool, guild_id: Option<&str>) -> Result<()> {
    match guild_id {
        Some(guild) => {
            sqlx::query("DELETE FROM movies WHERE guild_id = ?")
                .bind(guild)
                .execute(pool)
                .await?;
        }
        None => {
            sqlx::query("DELETE FROM movies").execute(pool).await?;
        }
    }

    Ok(())
}

/// Global metadata cache lookup, not scoped to a guild
///
/// Two guilds storing the same title share one provider fetch through this
/// path. Ambiguity counts distinct movie names, so the same name cached by
/// several guilds still resolves.
pub async fn lookup_metadata_by_name(pool: &SqlitePool, query: &str) -> Result<MetadataLookup> {
    let rows = sqlx::query(
        r#"
        SELECT movie_name, metadata FROM movies
        WHERE LOWER(movie_name) LIKE '%' || LOWER(?) || '%'
        ORDER BY LENGTH(movie_name) ASC
        "#,
    )
    .bind(query)
    .fetch_all(pool)
    .await?;

    let mut distinct_names: Vec<String> = Vec::new();
    let mut first_blob: Option<String> = None;

    for row in &rows {
        let name: String = row.get("movie_name");
        if !distinct_names.contains(&name) {
            distinct_names.push(name);
        }
        if first_blob.is_none() {
            first_blob = Some(row.get("metadata"));
        }
    }

    match distinct_names.len() {
        0 => Ok(MetadataLookup::NotFound),
        1 => {
            let blob = first_blob
                .ok_or_else(|| Error::Internal("matched name without a metadata row".to_string()))?;
            Ok(MetadataLookup::Found(MovieMetadata::from_json(&blob)?))
        }
        _ => Ok(MetadataLookup::Ambiguous(distinct_names)),
    }
}

/// Search within an open transaction and require exactly one match
async fn require_single_match(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    guild_id: &str,
    name: &str,
) -> Result<(Uuid, String)> {
    let rows = sqlx::query(SEARCH_SQL)
        .bind(guild_id)
        .bind(name)
        .fetch_all(&mut **tx)
        .await?;

    match rows.len() {
        0 => Err(Error::NotFound(format!(
            "couldn't find any movies with the name: {}",
            name
        ))),
        1 => {
            let id_str: String = rows[0].get("id");
            let id = Uuid::parse_str(&id_str)
                .map_err(|e| Error::Internal(format!("invalid record id {}: {}", id_str, e)))?;
            Ok((id, rows[0].get("movie_name")))
        }
        _ => {
            let names: Vec<String> = rows.iter().map(|row| row.get("movie_name")).collect();
            Err(Error::Ambiguous(format!(
                "found more than one movie with the name: {}. Found: {}",
                name,
                names.join(", ")
            )))
        }
    }
}
