//! Direct Message Data Structure
//!
//! Represents a one-to-one message. Messages are immutable except for the
//! `read` flag, which transitions false -> true exactly once, and only by the
//! receiver. Messages are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A direct message between two users
///
/// Wire shape: `{ id, sender_id, receiver_id, content, created_at: RFC3339,
/// read }` - exactly the columns the managed service stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// User the message is addressed to
    pub receiver_id: Uuid,
    /// Message content
    pub content: String,
    /// When the message was created
    pub created_at: DateTime<Utc>,
    /// Whether the receiver has read the message
    pub read: bool,
}

impl Message {
    /// Create a new unread message from `sender_id` to `receiver_id`
    pub fn new(sender_id: Uuid, receiver_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            receiver_id,
            content: content.into(),
            created_at: Utc::now(),
            read: false,
        }
    }

    /// The other party in this message relative to `user_id`, or `None` if
    /// the user is not a participant
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.sender_id == user_id {
            Some(self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(self.sender_id)
        } else {
            None
        }
    }

    /// Whether this message is exactly between the two given users
    pub fn between(&self, a: Uuid, b: Uuid) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    /// Get a preview of the message (first `max_len` characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }

    /// Parse a message from a service row
    pub fn from_row(row: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row.clone())
    }

    /// Serialize this message as a service row
    pub fn to_row(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_is_unread() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let message = Message::new(sender, receiver, "hello");
        assert!(!message.read);
        assert_eq!(message.sender_id, sender);
        assert_eq!(message.receiver_id, receiver);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_counterparty() {
        let sender = Uuid::new_v4();
        let receiver = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let message = Message::new(sender, receiver, "hello");
        assert_eq!(message.counterparty(sender), Some(receiver));
        assert_eq!(message.counterparty(receiver), Some(sender));
        assert_eq!(message.counterparty(outsider), None);
    }

    #[test]
    fn test_between() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let message = Message::new(a, b, "hello");
        assert!(message.between(a, b));
        assert!(message.between(b, a));
        assert!(!message.between(a, c));
    }

    #[test]
    fn test_preview_truncates() {
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "a very long message body");
        assert_eq!(message.preview(10), "a very ...");
        assert_eq!(message.preview(100), "a very long message body");
    }

    #[test]
    fn test_row_round_trip() {
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "Salut 👋");
        let row = message.to_row().unwrap();
        assert!(row["created_at"].is_string());
        let parsed = Message::from_row(&row).unwrap();
        assert_eq!(parsed, message);
    }
}
