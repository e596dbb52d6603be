//! Host-facing error type.
//!
//! [`ProviderError`] covers failures of the host plumbing itself: a request
//! for a resource type this provider does not serve, a call before
//! `configure`, a payload that is not JSON of the expected shape. Anything
//! that goes wrong while reconciling a resource is reported as a diagnostic
//! instead, see [`crate::diagnostics`].

use thiserror::Error;

/// Errors returned from [`crate::ProviderService`] methods.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The requested data source type is unknown.
    #[error("Unknown data source type: {0}")]
    UnknownDataSource(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid request from the host.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> &str {
        match self {
            Self::Configuration(msg) => msg,
            Self::UnknownResource(msg) => msg,
            Self::UnknownDataSource(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
            Self::InvalidRequest(msg) => msg,
        }
    }

    /// The provider was used before `configure`.
    pub fn not_configured() -> Self {
        Self::Configuration("provider is not configured; call configure first".to_string())
    }
}
