//! Custom error types for trialharvest.
//!
//! Library functions return `Result<T, TrialsError>`. Extraction misses and
//! malformed nested fields are not errors; they surface as absent values.

use thiserror::Error;

/// Main error type for trialharvest operations.
#[derive(Debug, Error)]
pub enum TrialsError {
    /// Headless browser launch or CDP command failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Rate limited by the registry API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Registry API returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Status text and response excerpt
        message: String,
    },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid caller input
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias using `TrialsError`
pub type Result<T> = std::result::Result<T, TrialsError>;
