//! Error types for the people fetcher

use thiserror::Error;

/// Result type alias for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Errors that can occur while loading people
#[derive(Error, Debug)]
pub enum FetcherError {
    /// Missing or placeholder configuration values
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database was unreachable or rejected the credentials
    #[error("Database connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// The popular people listing could not be fetched
    #[error("Failed to fetch popular people: {reason}")]
    Fetch { reason: String },

    /// The detail request for a single person failed
    #[error("Failed to fetch details for person {person_id}: {reason}")]
    DetailFetch { person_id: i64, reason: String },

    /// An insert or commit failed
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl FetcherError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new list fetch error
    pub fn fetch(reason: impl Into<String>) -> Self {
        Self::Fetch { reason: reason.into() }
    }

    /// Create a new per-person detail fetch error
    pub fn detail_fetch(person_id: i64, reason: impl Into<String>) -> Self {
        Self::DetailFetch { person_id, reason: reason.into() }
    }

    /// Process exit code for this failure class
    pub fn exit_code(&self) -> u8 {
        match self {
            FetcherError::Config(_) => 1,
            FetcherError::Fetch { .. } | FetcherError::DetailFetch { .. } => 2,
            FetcherError::Connection(_) | FetcherError::Storage(_) => 3,
        }
    }
}
