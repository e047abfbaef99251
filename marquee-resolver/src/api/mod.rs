//! HTTP API for marquee-resolver

mod health;
mod movies;

pub use health::health_routes;
pub use movies::movie_routes;
