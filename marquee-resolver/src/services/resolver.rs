//! Resolution & disambiguation engine
//!
//! Turns an ambiguous free-text or IMDb-link query into a single canonical
//! catalog record, reusing stored metadata and memoized provider searches
//! before going to the network, and lets a user correct a wrong automatic
//! match through a numbered-choice protocol.
//!
//! Callers serialize requests per guild (one in-flight resolution per guild
//! at a time); the engine's multi-step sequences are not atomic against
//! concurrent resolutions for the same guild and name.

use std::sync::Arc;

use chrono::Utc;
use marquee_common::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::movies::{self, MetadataLookup, MovieRecord};
use crate::models::{MovieMetadata, IMDB_URL_BASE, METADATA_VERSION};
use crate::services::omdb_client::{MetadataProvider, SearchCandidate};
use crate::services::search_cache::SearchCache;
use crate::services::session_state::SessionState;

/// Maximum candidates shown in a disambiguation list
pub const MAX_CANDIDATES: usize = 5;

static IMDB_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"imdb\.com/title/tt(\d+)").expect("valid pattern"));

/// One numbered disambiguation choice
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Position in the cached provider result list; the number a user
    /// supplies to pick this candidate
    pub rank: usize,
    pub title: String,
    pub imdb_url: String,
}

/// Result of a completed correction
#[derive(Debug, Clone, Serialize)]
pub struct ReplacementSummary {
    pub old_title: String,
    pub new_title: String,
    pub new_link: String,
}

/// Outcome of a correction request
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrectionResult {
    Candidates { candidates: Vec<Candidate> },
    Replacement { replacement: ReplacementSummary },
}

/// Resolution & disambiguation engine
///
/// Owns the session state and search cache outright; the catalog pool is
/// shared with the HTTP layer.
pub struct Resolver {
    db: SqlitePool,
    provider: Arc<dyn MetadataProvider>,
    search_cache: SearchCache,
    sessions: SessionState,
}

impl Resolver {
    pub fn new(db: SqlitePool, provider: Arc<dyn MetadataProvider>, search_cache: SearchCache) -> Self {
        Self {
            db,
            provider,
            search_cache,
            sessions: SessionState::new(),
        }
    }

    /// Resolve a query into a stored catalog record
    ///
    /// An omitted or empty query substitutes the guild's last mentioned
    /// movie. An IMDb link is authoritative and stores the provider's
    /// long-form title; free text stores the literal query as the canonical
    /// name, matched against the provider's top search hit.
    pub async fn resolve_add(&self, guild_id: &str, user: &str, query: Option<&str>) -> Result<String> {
        let query = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => q.to_string(),
            None => self.last_mentioned_or_err(guild_id).await?,
        };

        let (movie_name, metadata) = if let Some(imdb_id) = extract_imdb_id(&query) {
            let metadata = self.fetch_metadata(&imdb_id).await?;
            (metadata.long_title.clone(), metadata)
        } else {
            let metadata = match movies::lookup_metadata_by_name(&self.db, &query).await? {
                MetadataLookup::Found(metadata) => {
                    tracing::debug!(query = %query, "Metadata served from catalog");
                    metadata
                }
                MetadataLookup::Ambiguous(names) => {
                    return Err(Error::Ambiguous(format!(
                        "too many stored movies match \"{}\": {}",
                        query,
                        names.join(", ")
                    )));
                }
                MetadataLookup::NotFound => {
                    let candidates = self.cached_search(&query).await?;
                    // Rank 0 is the provider's best match
                    self.fetch_metadata(&candidates[0].imdb_id).await?
                }
            };
            (query.clone(), metadata)
        };

        let runtime_minutes = metadata
            .runtime_minutes
            .ok_or_else(|| Error::MissingRuntime(metadata.long_title.clone()))?;

        let record = MovieRecord::new(guild_id, &movie_name, user, runtime_minutes, metadata);
        movies::add_movie(&self.db, &record).await?;

        self.sessions.set_last_mentioned(guild_id, &movie_name).await;
        tracing::info!(guild = %guild_id, movie = %movie_name, user = %user, "Movie added");

        Ok(movie_name)
    }

    /// Numbered-choice correction protocol
    ///
    /// - no option: list up to five candidates for the guild's last
    ///   mentioned query
    /// - a number n: replace the last mentioned record with candidate n
    ///   from the full cached result list
    /// - new text or an IMDb link: fresh resolution of that query; the
    ///   prior (possibly wrong) record stays in place
    pub async fn resolve_correct(
        &self,
        guild_id: &str,
        user: &str,
        option: Option<&str>,
    ) -> Result<CorrectionResult> {
        let option = option.map(str::trim).filter(|o| !o.is_empty());

        match option {
            None => {
                let last = self.last_mentioned_or_err(guild_id).await?;
                let candidates = self.candidate_list(&last).await?;
                Ok(CorrectionResult::Candidates { candidates })
            }
            Some(opt) if opt.chars().all(|c| c.is_ascii_digit()) => {
                let rank: usize = opt
                    .parse()
                    .map_err(|_| Error::InvalidInput(format!("not a valid option: {}", opt)))?;
                let replacement = self.apply_correction(guild_id, user, rank).await?;
                Ok(CorrectionResult::Replacement { replacement })
            }
            Some(opt) => {
                let old_title = self.last_mentioned_or_err(guild_id).await?;
                let new_title = self.resolve_add(guild_id, user, Some(opt)).await?;
                let new_link = self.get_link(guild_id, Some(&new_title)).await?;
                Ok(CorrectionResult::Replacement {
                    replacement: ReplacementSummary {
                        old_title,
                        new_title,
                        new_link,
                    },
                })
            }
        }
    }

    /// Reciprocal IMDb link for a stored (or named) movie
    pub async fn get_link(&self, guild_id: &str, movie_name: Option<&str>) -> Result<String> {
        let name = match movie_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => self.last_mentioned_or_err(guild_id).await?,
        };

        let metadata = self.metadata_for_name(&name).await?;
        self.sessions.set_last_mentioned(guild_id, &name).await;

        Ok(metadata.imdb_url())
    }

    /// Runtime in minutes of a stored (or named) movie
    pub async fn runtime_of(&self, guild_id: &str, movie_name: Option<&str>) -> Result<u32> {
        let name = match movie_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => self.last_mentioned_or_err(guild_id).await?,
        };

        let metadata = self.metadata_for_name(&name).await?;
        self.sessions.set_last_mentioned(guild_id, &name).await;

        metadata
            .runtime_minutes
            .ok_or_else(|| Error::MissingRuntime(name))
    }

    /// All stored names, alphabetical
    pub async fn list(&self, guild_id: &str) -> Result<Vec<String>> {
        movies::list_for_guild(&self.db, guild_id).await
    }

    /// Stored names with runtime strictly below the bound
    pub async fn list_below_runtime(&self, guild_id: &str, max_minutes: u32) -> Result<Vec<String>> {
        movies::movies_below_runtime(&self.db, guild_id, max_minutes).await
    }

    /// Uniform random pick over the guild's catalog
    pub async fn pick(&self, guild_id: &str) -> Result<String> {
        let name = movies::pick_random(&self.db, guild_id).await?;
        self.sessions.set_last_mentioned(guild_id, &name).await;
        Ok(name)
    }

    /// Uniform random pick among movies below a runtime bound
    pub async fn pick_below_runtime(&self, guild_id: &str, max_minutes: u32) -> Result<String> {
        let name = movies::pick_random_below_runtime(&self.db, guild_id, max_minutes).await?;
        self.sessions.set_last_mentioned(guild_id, &name).await;
        Ok(name)
    }

    /// Remove the single record matching the name (or the last mentioned)
    pub async fn remove(&self, guild_id: &str, movie_name: Option<&str>) -> Result<String> {
        let name = match movie_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_string(),
            None => self.last_mentioned_or_err(guild_id).await?,
        };

        let removed = movies::delete_by_exact_name(&self.db, guild_id, &name).await?;
        tracing::info!(guild = %guild_id, movie = %removed, "Movie removed");
        Ok(removed)
    }

    /// Fuzzy catalog search, shortest matching names first
    pub async fn search(&self, guild_id: &str, query: &str) -> Result<Vec<String>> {
        movies::search_names(&self.db, guild_id, query).await
    }

    async fn last_mentioned_or_err(&self, guild_id: &str) -> Result<String> {
        self.sessions
            .last_mentioned(guild_id)
            .await
            .ok_or_else(|| Error::SessionState(guild_id.to_string()))
    }

    /// Provider search through the memoization cache
    ///
    /// The full ordered result list is cached (empty lists included) before
    /// an empty result is reported as a provider error, so a hopeless query
    /// repeated verbatim does not re-hit the provider.
    async fn cached_search(&self, query: &str) -> Result<Vec<SearchCandidate>> {
        let results = match self.search_cache.get(query).await {
            Some(hit) => {
                tracing::debug!(query = %query, "Search cache hit");
                hit
            }
            None => {
                let fetched = self
                    .provider
                    .search_movie(query)
                    .await
                    .map_err(|e| Error::Provider(e.to_string()))?;
                self.search_cache.insert(query, fetched.clone()).await;
                fetched
            }
        };

        if results.is_empty() {
            return Err(Error::Provider(format!("no results for \"{}\"", query)));
        }

        Ok(results)
    }

    /// Fetch full metadata by IMDb identifier and stamp it
    async fn fetch_metadata(&self, imdb_id: &str) -> Result<MovieMetadata> {
        let record = self
            .provider
            .get_by_id(imdb_id)
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        Ok(MovieMetadata {
            version: METADATA_VERSION,
            imdb_id: record.imdb_id,
            long_title: record.long_title,
            runtime_minutes: record.runtime_minutes,
            fetched_at: Utc::now(),
        })
    }

    /// Metadata for a movie name: stored catalog blob first, provider's top
    /// search match as fallback
    async fn metadata_for_name(&self, movie_name: &str) -> Result<MovieMetadata> {
        match movies::lookup_metadata_by_name(&self.db, movie_name).await? {
            MetadataLookup::Found(metadata) => Ok(metadata),
            MetadataLookup::Ambiguous(names) => Err(Error::Ambiguous(format!(
                "too many stored movies match \"{}\": {}",
                movie_name,
                names.join(", ")
            ))),
            MetadataLookup::NotFound => {
                tracing::debug!(movie = %movie_name, "No stored metadata, asking provider");
                let candidates = self.cached_search(movie_name).await?;
                self.fetch_metadata(&candidates[0].imdb_id).await
            }
        }
    }

    /// Up to five candidates for a disambiguation list
    async fn candidate_list(&self, query: &str) -> Result<Vec<Candidate>> {
        let results = self.cached_search(query).await?;

        Ok(results
            .iter()
            .take(MAX_CANDIDATES)
            .enumerate()
            .map(|(rank, candidate)| Candidate {
                rank,
                title: candidate.title.clone(),
                imdb_url: build_imdb_link(&candidate.imdb_id),
            })
            .collect())
    }

    /// Replace the last mentioned record with candidate `rank` from the
    /// full cached result list
    async fn apply_correction(
        &self,
        guild_id: &str,
        user: &str,
        rank: usize,
    ) -> Result<ReplacementSummary> {
        let last = self.last_mentioned_or_err(guild_id).await?;
        let candidates = self.cached_search(&last).await?;

        let chosen = candidates.get(rank).ok_or(Error::IndexOutOfRange {
            given: rank,
            available: candidates.len(),
        })?;

        let metadata = self.fetch_metadata(&chosen.imdb_id).await?;
        let runtime_minutes = metadata
            .runtime_minutes
            .ok_or_else(|| Error::MissingRuntime(metadata.long_title.clone()))?;

        let new_title = metadata.long_title.clone();
        let new_link = metadata.imdb_url();

        let record = MovieRecord::new(guild_id, &new_title, user, runtime_minutes, metadata);
        let old_title = movies::replace_movie(&self.db, guild_id, &last, &record).await?;

        self.sessions.set_last_mentioned(guild_id, &new_title).await;
        tracing::info!(
            guild = %guild_id,
            old = %old_title,
            new = %new_title,
            "Correction applied"
        );

        Ok(ReplacementSummary {
            old_title,
            new_title,
            new_link,
        })
    }
}

/// Extract the digit run from an IMDb title URL, if the query is one
fn extract_imdb_id(query: &str) -> Option<String> {
    IMDB_URL_RE
        .captures(query)
        .map(|caps| caps[1].to_string())
}

/// Reciprocal link for an IMDb identifier
fn build_imdb_link(imdb_id: &str) -> String {
    format!("{}{}", IMDB_URL_BASE, imdb_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_imdb_id_from_full_url() {
        assert_eq!(
            extract_imdb_id("https://www.imdb.com/title/tt0114709"),
            Some("0114709".to_string())
        );
    }

    #[test]
    fn test_extract_imdb_id_from_url_with_trailing_path() {
        assert_eq!(
            extract_imdb_id("check this out https://www.imdb.com/title/tt0078748/?ref_=fn_al_tt_1"),
            Some("0078748".to_string())
        );
    }

    #[test]
    fn test_extract_imdb_id_rejects_free_text() {
        assert_eq!(extract_imdb_id("the matrix"), None);
        assert_eq!(extract_imdb_id("tt0133093"), None);
    }

    #[test]
    fn test_build_imdb_link() {
        assert_eq!(
            build_imdb_link("0114709"),
            "https://www.imdb.com/title/tt0114709"
        );
    }
}
