// src/error.rs

//! Unified error handling for the resolution engine.

use std::fmt;

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport failure or non-success status from the upstream API
    #[error("Upstream unavailable for {target}: {message}")]
    UpstreamUnavailable { target: String, message: String },

    /// Upstream payload did not parse or lacked its required shape
    #[error("Malformed upstream response for {target}: {message}")]
    MalformedUpstreamResponse { target: String, message: String },

    /// Upstream answered well-formed but reported zero matches
    #[error("No results found for '{term}'")]
    NoResultsFound { term: String },

    /// Thumbnail store read or write failed
    #[error("Store error: {0}")]
    Store(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an upstream transport error for a request target.
    pub fn upstream(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::UpstreamUnavailable {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed-response error for a request target.
    pub fn malformed(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedUpstreamResponse {
            target: target.into(),
            message: message.to_string(),
        }
    }

    /// Create a no-results error.
    pub fn no_results(term: impl Into<String>) -> Self {
        Self::NoResultsFound { term: term.into() }
    }

    /// Create a store error.
    pub fn store(message: impl fmt::Display) -> Self {
        Self::Store(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether a caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }

    /// Stable machine-readable label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::MalformedUpstreamResponse { .. } => "malformed_upstream_response",
            Self::NoResultsFound { .. } => "no_results_found",
            Self::Store(_) => "store",
            Self::Io(_) => "io",
            Self::Http(_) => "http",
            Self::Json(_) => "json",
            Self::Toml(_) => "toml",
            Self::Url(_) => "url",
            Self::Config(_) => "config",
            Self::Validation(_) => "validation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_errors_are_retryable() {
        assert!(AppError::upstream("t", "timeout").is_retryable());
        assert!(!AppError::malformed("t", "bad json").is_retryable());
        assert!(!AppError::no_results("dune").is_retryable());
    }

    #[test]
    fn test_display_includes_target() {
        let err = AppError::malformed("https://example.com/v/abc123", "missing volumeInfo");
        let text = err.to_string();
        assert!(text.contains("abc123"));
        assert!(text.contains("missing volumeInfo"));
        assert_eq!(err.kind(), "malformed_upstream_response");
    }
}
