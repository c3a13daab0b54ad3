//! User profile display data.
//!
//! Profiles are owned by the wider application; the messaging subsystem only
//! reads them to attach a display name and avatar to conversations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A user's display profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// User ID
    pub id: Uuid,
    /// Display name
    pub username: String,
    /// Public avatar URL, if one has been uploaded
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    pub fn new(id: Uuid, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            avatar_url: None,
        }
    }

    /// Parse a profile from a service row
    pub fn from_row(row: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row.clone())
    }

    /// Serialize this profile as a service row
    pub fn to_row(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
