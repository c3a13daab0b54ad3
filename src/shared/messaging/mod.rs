//! Messaging Record Types
//!
//! This module contains the record types for the messaging system:
//!
//! - `Message` - a direct message between two users
//! - `Friendship` - a friend-request record and its lifecycle status
//! - `Profile` - display data for a user (joined, not owned)
//! - `ConversationSummary` - the derived per-counterparty view

pub mod conversation;
pub mod friendship;
pub mod message;
pub mod profile;

// Re-export all types
pub use conversation::ConversationSummary;
pub use friendship::{Friendship, FriendshipStatus};
pub use message::Message;
pub use profile::Profile;
