//! Error types for the registry client.

use thiserror::Error;

/// Result type for registry client operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Registry client errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Input rejected before any request was made
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The registry answered with its own error list
    #[error("Registry rejected query: {0}")]
    Rejected(String),
}
