//! # Marquee Common Library
//!
//! Shared code for the Marquee movie-catalog service:
//! - Error taxonomy
//! - Configuration loading and root folder resolution
//! - Database schema initialization

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
