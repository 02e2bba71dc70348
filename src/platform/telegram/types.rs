use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::User;

/// One event delivered by Telegram, via `getUpdates` or the webhook
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    /// Kept untyped so that a malformed message is told apart from an absent one
    #[serde(default)]
    pub message: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub message_id: Option<i64>,
    pub from: TelegramUser,
    #[serde(default)]
    pub chat: Option<Chat>,
    /// Unix time
    pub date: i64,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl From<TelegramUser> for User {
    fn from(user: TelegramUser) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Envelope returned by every Bot API method
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}
