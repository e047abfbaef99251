//! Bounded memoization of provider search results
//!
//! Keyed by the literal query string the user typed; case and whitespace
//! differences are distinct keys on purpose. Entries are shared across
//! guilds since provider metadata is guild-independent. Capacity is
//! enforced by evicting the oldest insertion; entries also expire after a
//! TTL. Last write wins on key collision.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::services::omdb_client::SearchCandidate;

/// Default maximum number of memoized queries
pub const DEFAULT_CAPACITY: usize = 256;

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    candidates: Vec<SearchCandidate>,
    inserted_at: Instant,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest first
    order: VecDeque<String>,
}

/// Bounded, TTL-expiring search result cache
pub struct SearchCache {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl SearchCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Memoized candidate list for a literal query string, if still fresh
    pub async fn get(&self, query: &str) -> Option<Vec<SearchCandidate>> {
        let mut inner = self.inner.lock().await;

        let expired = match inner.entries.get(query) {
            Some(entry) if entry.inserted_at.elapsed() >= self.ttl => true,
            Some(entry) => return Some(entry.candidates.clone()),
            None => return None,
        };

        if expired {
            inner.entries.remove(query);
            inner.order.retain(|key| key != query);
        }

        None
    }

    /// Memoize the full ordered result list for a query
    pub async fn insert(&self, query: &str, candidates: Vec<SearchCandidate>) {
        let mut inner = self.inner.lock().await;

        if inner.entries.contains_key(query) {
            inner.order.retain(|key| key != query);
        } else if inner.entries.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                tracing::debug!(query = %oldest, "Evicting oldest search cache entry");
                inner.entries.remove(&oldest);
            }
        }

        inner.order.push_back(query.to_string());
        inner.entries.insert(
            query.to_string(),
            CacheEntry {
                candidates,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
