//! OMDb API client
//!
//! External metadata provider with in-process request rate limiting.
//! Failures propagate unmodified; the resolver performs no retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";
const USER_AGENT: &str = "Marquee/0.1.0 (https://github.com/marquee/marquee)";
const RATE_LIMIT_MS: u64 = 1000; // 1 request per second

/// Metadata provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Title not found: {0}")]
    TitleNotFound(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One provider search hit, in provider relevance order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// IMDb identifier digits (no "tt" prefix)
    pub imdb_id: String,
    /// Display title
    pub title: String,
}

/// Full metadata record for a single title
#[derive(Debug, Clone)]
pub struct ProviderRecord {
    /// IMDb identifier digits (no "tt" prefix)
    pub imdb_id: String,
    /// Long-form title, e.g. "Toy Story (1995)"
    pub long_title: String,
    /// Runtime in minutes; None when the provider record has no runtime
    pub runtime_minutes: Option<u32>,
}

/// External metadata provider capability
///
/// Stateless and read-only from the resolver's perspective. An empty search
/// result is returned as an empty list; the resolver decides whether that is
/// an error.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search by title, best match first
    async fn search_movie(&self, title: &str) -> Result<Vec<SearchCandidate>, ProviderError>;

    /// Fetch full metadata by IMDb identifier digits
    async fn get_by_id(&self, imdb_id: &str) -> Result<ProviderRecord, ProviderError>;
}

/// Rate limiter enforcing 1 request/second
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    /// Wait if necessary to comply with rate limit
    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

// OMDb wire format

#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search")]
    search: Option<Vec<OmdbSearchHit>>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchHit {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

#[derive(Debug, Deserialize)]
struct OmdbTitleResponse {
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "Runtime")]
    runtime: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Error")]
    error: Option<String>,
}

/// OMDb API client
pub struct OmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl OmdbClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        // Rate limit
        self.rate_limiter.wait().await;

        let response = self
            .http_client
            .get(OMDB_BASE_URL)
            .query(&[("apikey", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MetadataProvider for OmdbClient {
    async fn search_movie(&self, title: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        tracing::debug!(title = %title, "Querying OMDb search API");

        let body: OmdbSearchResponse =
            self.get_json(&[("s", title), ("type", "movie")]).await?;

        if body.response != "True" {
            let message = body.error.unwrap_or_else(|| "unknown error".to_string());
            // "Movie not found!" is an empty result, not a failure
            if message.contains("not found") {
                return Ok(Vec::new());
            }
            return Err(ProviderError::ApiError(200, message));
        }

        let candidates: Vec<SearchCandidate> = body
            .search
            .unwrap_or_default()
            .into_iter()
            .map(|hit| SearchCandidate {
                imdb_id: hit.imdb_id.trim_start_matches("tt").to_string(),
                title: hit.title,
            })
            .collect();

        tracing::info!(
            title = %title,
            results = candidates.len(),
            "Retrieved search results from OMDb"
        );

        Ok(candidates)
    }

    async fn get_by_id(&self, imdb_id: &str) -> Result<ProviderRecord, ProviderError> {
        let tt_id = format!("tt{}", imdb_id);

        tracing::debug!(imdb_id = %tt_id, "Querying OMDb title API");

        let body: OmdbTitleResponse =
            self.get_json(&[("i", tt_id.as_str()), ("plot", "short")]).await?;

        if body.response != "True" {
            let message = body.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(ProviderError::TitleNotFound(format!("{}: {}", tt_id, message)));
        }

        let title = body
            .title
            .ok_or_else(|| ProviderError::ParseError(format!("no title in record for {}", tt_id)))?;
        let long_title = build_long_title(&title, body.year.as_deref());
        let digits = body
            .imdb_id
            .as_deref()
            .unwrap_or(tt_id.as_str())
            .trim_start_matches("tt")
            .to_string();

        tracing::info!(imdb_id = %tt_id, title = %long_title, "Retrieved title from OMDb");

        Ok(ProviderRecord {
            imdb_id: digits,
            long_title,
            runtime_minutes: body.runtime.as_deref().and_then(parse_runtime_minutes),
        })
    }
}

/// "Title" + "Year" -> "Title (Year)", matching long-form display titles
fn build_long_title(title: &str, year: Option<&str>) -> String {
    match year {
        Some(year) if !year.is_empty() && year != "N/A" => format!("{} ({})", title, year),
        _ => title.to_string(),
    }
}

/// Parse runtime strings like "142 min"; "N/A" and garbage yield None
fn parse_runtime_minutes(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
