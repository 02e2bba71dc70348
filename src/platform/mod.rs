pub mod telegram;

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Sender of an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_name {
            Some(last_name) => write!(f, "{} {} ({})", self.first_name, last_name, self.id),
            None => write!(f, "{} ({})", self.first_name, self.id),
        }
    }
}

/// A message received from any platform
#[derive(Debug, Clone)]
pub struct Message {
    /// Platform-specific message ID, when the provider sends one
    pub id: Option<i64>,
    /// Platform identifier (e.g., "telegram")
    pub platform: String,
    pub user: User,
    /// Platform-specific chat ID, when the provider sends one
    pub chat_id: Option<i64>,
    /// The message text
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// The update exactly as it was delivered
    pub raw: Value,
}

impl Message {
    /// Chat to answer in. Private chats share the sender's ID.
    pub fn reply_chat_id(&self) -> i64 {
        self.chat_id.unwrap_or(self.user.id)
    }
}
