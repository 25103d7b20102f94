//! Error types for the image cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Fetch Error Enum ==
/// Unified error type for image loading.
///
/// Cloneable so that every caller joined on the same in-flight request
/// observes the same failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// A single attempt exceeded its deadline
    #[error("Timed out after {after:?} loading {id}")]
    Timeout { id: String, after: Duration },

    /// The underlying transport reported an error
    #[error("Transport failure: {0}")]
    TransportFailure(String),

    /// Transport failures persisted past the retry budget
    #[error("Failed to load {id} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        id: String,
        attempts: u32,
        last_error: String,
    },

    /// The identifier could not be parsed as a URL
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl FetchError {
    // == Is Timeout ==
    /// Returns true if this error is a deadline failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the image cache.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FetchError::ExhaustedRetries {
            id: "https://cdn.example.com/a.jpg".to_string(),
            attempts: 4,
            last_error: "connection reset".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("4 attempts"));
        assert!(msg.contains("connection reset"));

        let err = FetchError::Timeout {
            id: "a".to_string(),
            after: Duration::from_millis(10_000),
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("10s"));
    }

    #[test]
    fn test_error_clone_equality() {
        let err = FetchError::TransportFailure("boom".to_string());
        assert_eq!(err.clone(), err);
        assert!(!err.is_timeout());
    }
}
