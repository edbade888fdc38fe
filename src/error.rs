//! Error types for rag-indexer
//!
//! This module provides error handling for all indexer operations, including
//! configuration loading, corpus gathering, embedding requests, Qdrant calls
//! and checkpoint persistence.

use thiserror::Error;

/// Main error type for indexer operations
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Configuration errors (unreadable or malformed config file, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corpus gathering / text processing errors
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Embedding API errors (HTTP failures, malformed response shapes)
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Qdrant REST API errors (non-2xx on collection or point operations)
    #[error("Qdrant error: {0}")]
    Qdrant(String),

    /// Checkpoint persistence errors
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(String),
}

impl IndexerError {
    /// True when an embedding failure indicates the request payload was too
    /// large for the server. The driver reacts by retrying the batch one
    /// chunk at a time.
    pub fn is_input_too_large(&self) -> bool {
        match self {
            IndexerError::Embedding(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("input too large")
                    || msg.contains("too many tokens")
                    || msg.contains("context length")
                    || msg.contains("payload too large")
            }
            _ => false,
        }
    }
}

/// Result type alias for indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;

impl From<anyhow::Error> for IndexerError {
    fn from(err: anyhow::Error) -> Self {
        IndexerError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = IndexerError::Embedding("bad response".to_string());
        assert_eq!(error.to_string(), "Embedding error: bad response");
    }

    #[test]
    fn test_error_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let indexer_error = IndexerError::from(io_error);

        match indexer_error {
            IndexerError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_input_too_large_detection() {
        let err = IndexerError::Embedding("server said: Input Too Large (413)".to_string());
        assert!(err.is_input_too_large());

        let err = IndexerError::Embedding("connection refused".to_string());
        assert!(!err.is_input_too_large());

        let err = IndexerError::Qdrant("input too large".to_string());
        assert!(!err.is_input_too_large());
    }
}
