//! WMS error types.

use thiserror::Error;

/// Errors from building WMS requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WmsError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Unsupported URL scheme '{0}': expected http or https")]
    UnsupportedScheme(String),

    #[error("Invalid time '{value}': {reason}")]
    InvalidTime { value: String, reason: String },

    #[error("Invalid layer: {0}")]
    InvalidLayer(String),
}
