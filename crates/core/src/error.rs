//! Error types for mdsplit.
//!
//! This module defines a unified error enum covering configuration,
//! provider resolution, I/O and serialization failures. Parsing anomalies
//! inside a document are never errors; they are logged and degraded locally.

use std::fmt;
use thiserror::Error;

/// The kind of pluggable provider that failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Tokenizer,
    SentenceSplitter,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Tokenizer => write!(f, "tokenizer"),
            ProviderKind::SentenceSplitter => write!(f, "sentence splitter"),
        }
    }
}

/// Unified error type for mdsplit.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors are represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid settings or token-limit relationships
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tokenizer or sentence splitter name could not be resolved or loaded
    #[error("{kind} '{name}' not found: {reason}")]
    ProviderNotFound {
        kind: ProviderKind,
        name: String,
        reason: String,
    },

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for a tokenizer resolution failure.
    pub fn tokenizer_not_found(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ProviderNotFound {
            kind: ProviderKind::Tokenizer,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a sentence splitter resolution failure.
    pub fn sentence_splitter_not_found(
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AppError::ProviderNotFound {
            kind: ProviderKind::SentenceSplitter,
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_not_found_message() {
        let err = AppError::tokenizer_not_found("no-such-model", "unknown encoding");
        assert_eq!(
            err.to_string(),
            "tokenizer 'no-such-model' not found: unknown encoding"
        );

        let err = AppError::sentence_splitter_not_found("xx_missing", "no model file");
        assert!(err.to_string().starts_with("sentence splitter 'xx_missing'"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
