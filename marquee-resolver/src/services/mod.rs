//! Service layer for marquee-resolver

pub mod omdb_client;
pub mod resolver;
pub mod search_cache;
pub mod session_state;
