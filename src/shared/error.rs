//! Client Error Types
//!
//! This module defines the error taxonomy for the messaging client.
//!
//! # Error Categories
//!
//! - Friendship lifecycle outcomes: `AlreadyPending`, `AlreadyFriends`,
//!   `NotAddressed`, `Conflict`
//! - `Validation` - data validation failures caught before dispatch
//! - `Service` - failures crossing the Data & Realtime Service boundary
//!
//! # Propagation Policy
//!
//! All of these are recoverable: callers surface them as short user-facing
//! notifications and the operation is simply aborted. Nothing here is allowed
//! to crash a view, and nothing is retried automatically.

use thiserror::Error;

use crate::service::ServiceError;

/// Errors produced by the messaging client
#[derive(Debug, Error)]
pub enum ChatError {
    /// A friend request between the two users is already pending
    /// (in either direction)
    #[error("a friend request between these users is already pending")]
    AlreadyPending,

    /// The two users already have an accepted friendship
    #[error("these users are already friends")]
    AlreadyFriends,

    /// The caller is not the party allowed to perform this transition
    /// (accept/reject is receiver-only, cancel is sender-only)
    #[error("this friend request is not addressed to the calling user")]
    NotAddressed,

    /// The referenced record does not exist
    #[error("record not found")]
    NotFound,

    /// The record changed underneath the operation (e.g. the request was
    /// already accepted, rejected or cancelled by the other party)
    #[error("the record was modified concurrently")]
    Conflict,

    /// Data validation error, caught before anything is dispatched
    #[error("validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Failure at the Data & Realtime Service boundary
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ChatError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Service(ServiceError::from(err))
    }
}
