//! Friendship Data Structure
//!
//! Represents the friend-request record between two users.
//!
//! Lifecycle: created in `pending` by the requester; transitions to
//! `accepted` or `rejected` by the receiver only; a `pending` record may be
//! deleted by the original sender (cancel). At most one record exists per
//! unordered pair of users at any time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Status of a friendship record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    /// Request is pending
    Pending,
    /// Request was accepted
    Accepted,
    /// Request was rejected
    Rejected,
}

impl Default for FriendshipStatus {
    fn default() -> Self {
        FriendshipStatus::Pending
    }
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(FriendshipStatus::Pending),
            "accepted" => Some(FriendshipStatus::Accepted),
            "rejected" => Some(FriendshipStatus::Rejected),
            _ => None,
        }
    }
}

/// A friend-request record
///
/// Wire shape: `{ id, sender_id, receiver_id, status, created_at: RFC3339 }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friendship {
    /// Unique record ID
    pub id: Uuid,
    /// User who sent the request
    pub sender_id: Uuid,
    /// User who received the request
    pub receiver_id: Uuid,
    /// Current status
    #[serde(default)]
    pub status: FriendshipStatus,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    /// Create a new pending request with the caller as sender
    pub fn new(sender_id: Uuid, receiver_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Check if the request is pending
    pub fn is_pending(&self) -> bool {
        self.status == FriendshipStatus::Pending
    }

    /// The other party in this record relative to `user_id`
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.sender_id == user_id {
            Some(self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }

    /// Parse a friendship from a service row
    pub fn from_row(row: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row.clone())
    }

    /// Serialize this friendship as a service row
    pub fn to_row(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
