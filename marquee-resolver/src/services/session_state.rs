//! Per-guild "most recently discussed" movie pointer
//!
//! In-process only; pointers live for the process lifetime and are never
//! persisted across restarts. Overwritten on every successful add,
//! disambiguation request or correction, never explicitly deleted.

use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct SessionState {
    last_mentioned: RwLock<HashMap<String, String>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the movie most recently resolved or discussed for a guild
    pub async fn set_last_mentioned(&self, guild_id: &str, movie_name: &str) {
        self.last_mentioned
            .write()
            .await
            .insert(guild_id.to_string(), movie_name.to_string());
    }

    /// The movie most recently resolved or discussed for a guild, if any
    pub async fn last_mentioned(&self, guild_id: &str) -> Option<String> {
        self.last_mentioned.read().await.get(guild_id).cloned()
    }
}
