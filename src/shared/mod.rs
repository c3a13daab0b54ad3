//! Shared Module
//!
//! This module contains the domain types and supporting pieces used by both
//! the service boundary and the messaging client: message and friendship
//! records, profile display data, derived conversation summaries, the
//! client-level error taxonomy and service configuration.
//!
//! All record types serialize to the wire shapes the managed service stores,
//! with `created_at` as an RFC3339 string.

/// Client-level error types
pub mod error;

/// Service configuration
pub mod config;

/// Messaging record types
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, ServiceConfig, ServiceConfigBuilder};
pub use error::ChatError;
pub use messaging::{ConversationSummary, Friendship, FriendshipStatus, Message, Profile};
