//! Conversation Summary Data Structure
//!
//! The derived per-counterparty view shown in the conversation list. It has
//! no independent identity or lifecycle: it is regenerated from the message
//! set and holds the last message plus the unread count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::Profile;

/// Derived summary of a one-to-one conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationSummary {
    /// The other participant
    pub counterparty_id: Uuid,
    /// Display profile of the counterparty, when one exists
    pub profile: Option<Profile>,
    /// Content of the most recent message in either direction
    pub last_message: String,
    /// Timestamp of the most recent message
    pub last_message_at: DateTime<Utc>,
    /// Messages addressed to the current user and not yet read
    pub unread_count: u32,
}

impl ConversationSummary {
    /// Display name for the conversation list: the counterparty's username,
    /// falling back to their ID when no profile is available
    pub fn display_name(&self) -> String {
        match &self.profile {
            Some(profile) => profile.username.clone(),
            None => self.counterparty_id.to_string(),
        }
    }
}
