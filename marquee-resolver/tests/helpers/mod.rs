//! Shared test fixtures: in-memory database setup and a scripted
//! metadata provider with call counting.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use marquee_resolver::services::omdb_client::{
    MetadataProvider, ProviderError, ProviderRecord, SearchCandidate,
};
use marquee_resolver::services::resolver::Resolver;
use marquee_resolver::services::search_cache::SearchCache;

/// Scripted provider: canned search results and title records, with call
/// counters to assert cache behavior.
#[derive(Default)]
pub struct MockProvider {
    search_results: HashMap<String, Vec<SearchCandidate>>,
    records: HashMap<String, ProviderRecord>,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, results: Vec<SearchCandidate>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    pub fn with_record(mut self, record: ProviderRecord) -> Self {
        self.records.insert(record.imdb_id.clone(), record);
        self
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    async fn search_movie(&self, title: &str) -> Result<Vec<SearchCandidate>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.get(title).cloned().unwrap_or_default())
    }

    async fn get_by_id(&self, imdb_id: &str) -> Result<ProviderRecord, ProviderError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(imdb_id)
            .cloned()
            .ok_or_else(|| ProviderError::TitleNotFound(imdb_id.to_string()))
    }
}

pub fn candidate(imdb_id: &str, title: &str) -> SearchCandidate {
    SearchCandidate {
        imdb_id: imdb_id.to_string(),
        title: title.to_string(),
    }
}

pub fn record(imdb_id: &str, long_title: &str, runtime_minutes: Option<u32>) -> ProviderRecord {
    ProviderRecord {
        imdb_id: imdb_id.to_string(),
        long_title: long_title.to_string(),
        runtime_minutes,
    }
}

/// Six search hits for "alien", provider relevance order
pub fn alien_candidates() -> Vec<SearchCandidate> {
    vec![
        candidate("0078748", "Alien"),
        candidate("0090605", "Aliens"),
        candidate("0103644", "Alien 3"),
        candidate("0118583", "Alien: Resurrection"),
        candidate("2316204", "Alien: Covenant"),
        candidate("0093773", "Predator"),
    ]
}

/// A provider scripted with the alien franchise plus a few loose titles
pub fn scripted_provider() -> MockProvider {
    MockProvider::new()
        .with_search("alien", alien_candidates())
        .with_record(record("0078748", "Alien (1979)", Some(117)))
        .with_record(record("0090605", "Aliens (1986)", Some(137)))
        .with_record(record("0114709", "Toy Story (1995)", Some(81)))
        .with_record(record("0133093", "The Matrix (1999)", Some(136)))
}

pub async fn setup_pool() -> SqlitePool {
    // A single connection keeps every query on the same in-memory database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory database");
    marquee_common::db::init::init_schema(&pool).await.unwrap();
    pool
}

pub fn make_resolver(pool: SqlitePool, provider: Arc<MockProvider>) -> Resolver {
    Resolver::new(pool, provider, SearchCache::default())
}
