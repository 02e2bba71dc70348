use std::fmt;
use std::str::FromStr;

use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::trace;

use crate::error::{Error, Result};

/// Public Bot API endpoint
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Convert a snake_case method name into the mixedCase form used in Bot API URLs.
///
/// Underscores only separate words: empty segments from leading, trailing or
/// doubled underscores are dropped. The first word is kept as given and every
/// later word has its first character upper-cased, so `set_webhook` becomes
/// `setWebhook` and a name without underscores comes back unchanged.
pub fn mixed_case(name: &str) -> String {
    let mut words = name.split('_').filter(|word| !word.is_empty());
    let mut out = String::with_capacity(name.len());

    if let Some(first) = words.next() {
        out.push_str(first);
    }
    for word in words {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            out.extend(head.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}

/// Bot API operations this client implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    DeleteWebhook,
    GetUpdates,
    SendMessage,
    SetWebhook,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 4] = [
        ApiMethod::DeleteWebhook,
        ApiMethod::GetUpdates,
        ApiMethod::SendMessage,
        ApiMethod::SetWebhook,
    ];

    /// snake_case name, as callers refer to the operation
    pub fn name(self) -> &'static str {
        match self {
            ApiMethod::DeleteWebhook => "delete_webhook",
            ApiMethod::GetUpdates => "get_updates",
            ApiMethod::SendMessage => "send_message",
            ApiMethod::SetWebhook => "set_webhook",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| Error::UnsupportedOperation(s.to_string()))
    }
}

/// Thin client for the Telegram Bot HTTP API.
///
/// Every operation is a single JSON POST. Responses are handed back as-is:
/// no retries and no status or body checks happen here.
pub struct TelegramApi {
    client: Client,
    token: String,
    base_url: String,
}

impl TelegramApi {
    pub fn new(token: impl ToString) -> Self {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Point the client at another API host (a local Bot API server, or a mock in tests)
    pub fn with_base_url(token: impl ToString, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Replace the HTTP session used for outbound calls
    pub fn set_session(&mut self, client: Client) {
        self.client = client;
    }

    pub fn make_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, mixed_case(method))
    }

    /// Dispatch by name, rejecting operations that are not implemented
    pub async fn call_by_name(&self, method: &str, data: &Value) -> Result<Response> {
        let method: ApiMethod = method.parse()?;
        self.call(method, data).await
    }

    pub async fn call(&self, method: ApiMethod, data: &Value) -> Result<Response> {
        let url = self.make_url(method.name());
        trace!("Calling Telegram API method {}", method);

        let response = self.client.post(&url).json(data).send().await?;
        Ok(response)
    }

    pub async fn delete_webhook(&self) -> Result<Response> {
        self.call(ApiMethod::DeleteWebhook, &json!({})).await
    }

    pub async fn get_updates(&self, data: &Value) -> Result<Response> {
        self.call(ApiMethod::GetUpdates, data).await
    }

    pub async fn send_message(&self, data: &Value) -> Result<Response> {
        self.call(ApiMethod::SendMessage, data).await
    }

    pub async fn set_webhook(&self, data: &Value) -> Result<Response> {
        self.call(ApiMethod::SetWebhook, data).await
    }
}
