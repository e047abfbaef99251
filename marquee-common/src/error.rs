//! Common error types for Marquee

use thiserror::Error;

/// Common result type for Marquee operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the catalog, resolver and provider layers.
///
/// The resolver performs no local recovery: every variant propagates to the
/// caller verbatim, and the transport layer is responsible for user-facing
/// translation.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Zero matches where exactly one is required
    #[error("Not found: {0}")]
    NotFound(String),

    /// More than one match where exactly one is required
    #[error("Ambiguous match: {0}")]
    Ambiguous(String),

    /// A pick operation over an empty result set
    #[error("Empty catalog: {0}")]
    EmptyCatalog(String),

    /// External metadata lookup failure or empty search result
    #[error("Provider error: {0}")]
    Provider(String),

    /// Resolved metadata lacks a runtime field
    #[error("No runtime found for {0}")]
    MissingRuntime(String),

    /// Invalid disambiguation selection
    #[error("Option {given} is out of range ({available} candidates available)")]
    IndexOutOfRange { given: usize, available: usize },

    /// An omitted-query operation with no prior "last mentioned" entry
    #[error("No movie mentioned recently for guild {0}")]
    SessionState(String),

    /// Metadata blob could not be encoded or decoded
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
