//! Error types for provider operations.

use thiserror::Error;

/// Errors that can occur when calling a completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure reaching the backend.
    #[error("network error: {0}")]
    Network(String),

    /// The backend returned an error response.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered but produced no usable text.
    #[error("empty completion from provider")]
    EmptyCompletion,

    /// Failed to parse the backend response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
