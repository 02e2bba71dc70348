use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bottery::config::Config;
use bottery::platform::telegram::{Responder, TelegramEngine};
use bottery::platform::Message;

/// Answers "ping" with "pong"
struct PingResponder;

#[async_trait]
impl Responder for PingResponder {
    async fn respond(&self, message: &Message) -> Option<String> {
        message
            .text
            .trim()
            .eq_ignore_ascii_case("ping")
            .then(|| "pong".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bottery=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Mode: {}", config.telegram.mode);
    info!("  API: {}", config.telegram.api_url);

    let engine = TelegramEngine::from_config(&config.telegram)
        .with_responder(Arc::new(PingResponder));

    engine
        .configure()
        .await
        .context("Failed to reset Telegram webhook")?;

    info!("Bot is starting...");
    Arc::new(engine).run().await?;

    Ok(())
}
