use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use futures::future::try_join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{TelegramConfig, WebhookConfig};
use crate::error::{Error, Result};
use crate::platform::telegram::api::TelegramApi;
use crate::platform::telegram::types::{ApiResponse, TelegramMessage, Update};
use crate::platform::telegram::webhook;
use crate::platform::Message;

pub const PLATFORM: &str = "telegram";
pub const POLLING_MODE: &str = "polling";
pub const WEBHOOK_MODE: &str = "webhook";

/// Long-poll timeout passed to `getUpdates`, in seconds
pub const DEFAULT_POLL_TIMEOUT: u64 = 30;

/// Background work that delivers updates for a mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Pull updates with `getUpdates`
    Polling,
    /// Register the webhook URL and serve pushed updates
    Webhook,
    /// Work run by the embedding application itself
    Custom(String),
}

/// Produces the reply for an inbound message, if there is one
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, message: &Message) -> Option<String>;
}

pub struct TelegramEngine {
    api: TelegramApi,
    mode: String,
    tasks: HashMap<String, Task>,
    webhook: Option<WebhookConfig>,
    poll_timeout: u64,
    responder: Option<Arc<dyn Responder>>,
}

impl TelegramEngine {
    pub fn new(token: impl ToString) -> Self {
        Self::with_api(TelegramApi::new(token))
    }

    pub fn with_api(api: TelegramApi) -> Self {
        let mut tasks = HashMap::new();
        tasks.insert(POLLING_MODE.to_string(), Task::Polling);

        Self {
            api,
            mode: POLLING_MODE.to_string(),
            tasks,
            webhook: None,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            responder: None,
        }
    }

    pub fn from_config(config: &TelegramConfig) -> Self {
        let api = TelegramApi::with_base_url(&config.bot_token, config.api_url.as_str());
        let engine = Self::with_api(api)
            .with_mode(config.mode.as_str())
            .with_poll_timeout(config.poll_timeout);

        match &config.webhook {
            Some(webhook) => engine.with_webhook(webhook.clone()),
            None => engine,
        }
    }

    /// Any mode name is accepted; it only has to match a registered task when run
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn with_webhook(mut self, config: WebhookConfig) -> Self {
        self.tasks.insert(WEBHOOK_MODE.to_string(), Task::Webhook);
        self.webhook = Some(config);
        self
    }

    pub fn with_poll_timeout(mut self, seconds: u64) -> Self {
        self.poll_timeout = seconds;
        self
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: impl Into<String>) {
        self.mode = mode.into();
    }

    pub fn api(&self) -> &TelegramApi {
        &self.api
    }

    pub fn set_session(&mut self, client: Client) {
        self.api.set_session(client);
    }

    /// Bind `task` to `mode`, replacing whatever was registered before
    pub fn set_task(&mut self, mode: impl Into<String>, task: Task) {
        self.tasks.insert(mode.into(), task);
    }

    /// Tasks to run for the active mode.
    ///
    /// Fails with [`Error::UnknownMode`] when no task is registered under the
    /// mode name.
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.tasks
            .get(&self.mode)
            .map(|task| vec![task.clone()])
            .ok_or_else(|| Error::UnknownMode(self.mode.clone()))
    }

    /// Turn an update into a [`Message`].
    ///
    /// Updates without a `message` (edits, channel posts, ...) give `Ok(None)`.
    /// A `message` lacking `from`, `date` or `text` is a malformed payload.
    pub fn build_message(&self, payload: &Value) -> Result<Option<Message>> {
        let Some(data) = payload.get("message").filter(|data| !data.is_null()) else {
            return Ok(None);
        };

        let message = TelegramMessage::deserialize(data)?;
        let timestamp = DateTime::from_timestamp(message.date, 0)
            .ok_or(Error::InvalidTimestamp(message.date))?;

        Ok(Some(Message {
            id: message.message_id,
            platform: PLATFORM.to_string(),
            user: message.from.into(),
            chat_id: message.chat.map(|chat| chat.id),
            text: message.text,
            timestamp,
            raw: payload.clone(),
        }))
    }

    /// Drop any registered webhook so that updates can be polled.
    ///
    /// Returns whether Telegram confirmed the deletion. A refusal is not an error.
    pub async fn configure(&self) -> Result<bool> {
        let response = self.api.delete_webhook().await?;
        let body: ApiResponse<Value> = response.json().await?;

        if body.ok {
            debug!("Webhook deleted, delivering updates via {}", self.mode);
        }

        Ok(body.ok)
    }

    /// Build the message for an update and send the responder's reply, if any
    pub async fn message_handler(&self, payload: &Value) -> Result<()> {
        let Some(message) = self.build_message(payload)? else {
            debug!("Skipping update without a message");
            return Ok(());
        };

        info!("Telegram message from {}: {}", message.user, message.text);

        let Some(responder) = &self.responder else {
            return Ok(());
        };
        let Some(reply) = responder.respond(&message).await else {
            return Ok(());
        };

        let response = self
            .api
            .send_message(&json!({
                "chat_id": message.reply_chat_id(),
                "text": reply,
            }))
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("sendMessage failed ({}) for chat {}", status, message.reply_chat_id());
        }

        Ok(())
    }

    /// Fetch one batch of updates starting at `offset` and handle each of them.
    ///
    /// Returns the offset for the next call. Updates that fail to handle are
    /// logged and still acknowledged.
    pub async fn poll_once(&self, offset: i64) -> Result<i64> {
        let response = self
            .api
            .get_updates(&json!({
                "offset": offset,
                "timeout": self.poll_timeout,
            }))
            .await?;

        let body: ApiResponse<Vec<Value>> = response.json().await?;
        if !body.ok {
            return Err(Error::Api(
                body.description
                    .unwrap_or_else(|| "getUpdates was refused".to_string()),
            ));
        }

        let mut next_offset = offset;
        for payload in body.result.unwrap_or_default() {
            match Update::deserialize(&payload) {
                Ok(update) => next_offset = next_offset.max(update.update_id.saturating_add(1)),
                Err(e) => {
                    warn!("Dropping update without update_id: {}", e);
                    continue;
                }
            }

            if let Err(e) = self.message_handler(&payload).await {
                warn!("Failed to handle update: {}", e);
            }
        }

        Ok(next_offset)
    }

    /// Poll until the API or the transport fails
    pub async fn polling(&self) -> Result<()> {
        info!("Polling Telegram for updates...");

        let mut offset = 0;
        loop {
            offset = self.poll_once(offset).await?;
        }
    }

    /// Drive the tasks of the active mode until one of them fails
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let tasks = self.tasks()?;
        info!("Telegram engine running in {} mode", self.mode);

        try_join_all(
            tasks
                .into_iter()
                .map(|task| Arc::clone(&self).run_task(task)),
        )
        .await?;

        Ok(())
    }

    async fn run_task(self: Arc<Self>, task: Task) -> Result<()> {
        match task {
            Task::Polling => self.polling().await,
            Task::Webhook => {
                let config = self
                    .webhook
                    .clone()
                    .ok_or_else(|| Error::UnknownMode(WEBHOOK_MODE.to_string()))?;
                self.register_webhook(&config).await?;
                webhook::serve(self, &config).await
            }
            Task::Custom(name) => {
                warn!("Task '{}' is run by the application, skipping", name);
                Ok(())
            }
        }
    }

    async fn register_webhook(&self, config: &WebhookConfig) -> Result<()> {
        let response = self.api.set_webhook(&json!({ "url": config.url })).await?;
        let body: ApiResponse<Value> = response.json().await?;

        if !body.ok {
            return Err(Error::Api(
                body.description
                    .unwrap_or_else(|| "setWebhook was refused".to_string()),
            ));
        }

        info!("Webhook registered at {}", config.url);
        Ok(())
    }
}
