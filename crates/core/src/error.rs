//! Error types for docchat.
//!
//! One enum covers every failure category of the request pipeline:
//! configuration, embedding, passage search, prompt rendering and the
//! upstream completion stream.

use thiserror::Error;

/// Unified error type for docchat.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single embedding attempt failed (bad status, malformed body, empty vector, timeout)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Every embedding attempt failed; the service is warming up or down
    #[error("Embedding service unavailable after {attempts} attempts")]
    EmbeddingUnavailable { attempts: u32 },

    /// Vectors of different length were compared
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Passage store unreachable or query failure
    #[error("Search error: {0}")]
    Search(String),

    /// Completion service rejected or failed the request
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// The inbound request could not be understood
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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
    fn test_display_messages() {
        let err = AppError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 768, got 384");

        let err = AppError::EmbeddingUnavailable { attempts: 3 };
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
