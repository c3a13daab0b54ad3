//! Service Boundary Error Types
//!
//! Failures crossing the Data & Realtime Service boundary. The client
//! modules map these onto user-level outcomes; in particular `Conflict` is
//! the canonical signal for a uniqueness violation (duplicate friendship).

use thiserror::Error;

/// Errors from the Data & Realtime Service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network or service failure; the operation did not take effect
    #[error("service error: {message}")]
    Network {
        /// Human-readable error message
        message: String,
    },

    /// A storage-level constraint rejected the write
    #[error("conflict: {message}")]
    Conflict {
        /// Human-readable error message
        message: String,
    },

    /// The requested resource does not exist
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable error message
        message: String,
    },

    /// Row or payload (de)serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The subscription transport is closed
    #[error("subscription closed")]
    Closed,
}

impl ServiceError {
    /// Create a new network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::network(err.to_string())
    }
}
