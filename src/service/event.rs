//! Realtime Change Events
//!
//! This module defines the change notifications delivered over realtime
//! subscriptions: one event per row insert, update or delete, carrying the
//! row as it was written.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of row change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// A row was inserted
    Insert,
    /// A row was updated
    Update,
    /// A row was deleted
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// A row-change notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    /// What happened to the row
    pub kind: ChangeKind,
    /// Table the row belongs to
    pub table: String,
    /// The row as written (for deletes, as it was before removal)
    pub row: Value,
    /// When the event was emitted (RFC3339)
    pub timestamp: String,
}

impl ChangeEvent {
    /// Create a new change event with the current timestamp
    pub fn new(kind: ChangeKind, table: impl Into<String>, row: Value) -> Self {
        Self {
            kind,
            table: table.into(),
            row,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an insert event
    pub fn insert(table: impl Into<String>, row: Value) -> Self {
        Self::new(ChangeKind::Insert, table, row)
    }

    /// Create an update event
    pub fn update(table: impl Into<String>, row: Value) -> Self {
        Self::new(ChangeKind::Update, table, row)
    }

    /// Create a delete event
    pub fn delete(table: impl Into<String>, row: Value) -> Self {
        Self::new(ChangeKind::Delete, table, row)
    }
}

/// What a subscription wants delivered: one table, optionally restricted to
/// certain change kinds. Finer row-level filtering is the consumer's job -
/// the transport does not support compound predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDescriptor {
    /// Table to watch
    pub table: String,
    /// Change kinds to deliver; `None` means all
    pub kinds: Option<Vec<ChangeKind>>,
}

impl SubscriptionDescriptor {
    /// Watch every change on a table
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            kinds: None,
        }
    }

    /// Restrict to specific change kinds
    pub fn kinds(mut self, kinds: Vec<ChangeKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    /// Whether an event should be delivered to this subscription
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        match &self.kinds {
            Some(kinds) => kinds.contains(&event.kind),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_constructors() {
        let event = ChangeEvent::insert("messages", json!({"id": "m1"}));
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.table, "messages");
        assert!(!event.timestamp.is_empty());
    }

    #[test]
    fn test_descriptor_matches_table() {
        let descriptor = SubscriptionDescriptor::table("messages");
        assert!(descriptor.matches(&ChangeEvent::insert("messages", json!({}))));
        assert!(descriptor.matches(&ChangeEvent::update("messages", json!({}))));
        assert!(!descriptor.matches(&ChangeEvent::insert("friendships", json!({}))));
    }

    #[test]
    fn test_descriptor_restricts_kinds() {
        let descriptor =
            SubscriptionDescriptor::table("messages").kinds(vec![ChangeKind::Insert]);
        assert!(descriptor.matches(&ChangeEvent::insert("messages", json!({}))));
        assert!(!descriptor.matches(&ChangeEvent::update("messages", json!({}))));
    }

    #[test]
    fn test_event_serialization() {
        let event = ChangeEvent::update("messages", json!({"id": "m1", "read": true}));
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert!(json.contains("\"update\""));
    }
}
