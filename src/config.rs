use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

use crate::platform::telegram::api::DEFAULT_API_URL;
use crate::platform::telegram::engine::{DEFAULT_POLL_TIMEOUT, POLLING_MODE, WEBHOOK_MODE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Delivery mode: "polling", "webhook", or a mode the application registers itself
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Seconds Telegram holds a `getUpdates` request open
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct WebhookConfig {
    /// Public URL registered with `setWebhook`
    pub url: String,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_webhook_path")]
    pub path: String,
}

fn default_mode() -> String {
    POLLING_MODE.to_string()
}

fn default_poll_timeout() -> u64 {
    DEFAULT_POLL_TIMEOUT
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_webhook_path() -> String {
    "/telegram".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let telegram = &self.telegram;

        if telegram.bot_token.trim().is_empty() {
            anyhow::bail!("telegram.bot_token must not be empty");
        }

        match &telegram.webhook {
            Some(webhook) if !webhook.path.starts_with('/') => {
                anyhow::bail!(
                    "telegram.webhook.path must start with '/', got '{}'",
                    webhook.path
                );
            }
            None if telegram.mode == WEBHOOK_MODE => {
                anyhow::bail!("mode \"webhook\" requires a [telegram.webhook] section");
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.telegram.mode, "polling");
        assert_eq!(config.telegram.poll_timeout, 30);
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert!(config.telegram.webhook.is_none());
    }

    #[test]
    fn test_webhook_section() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            mode = "webhook"

            [telegram.webhook]
            url = "https://bot.example.com/telegram"
            "#,
        )
        .unwrap();

        let webhook = config.telegram.webhook.unwrap();
        assert_eq!(webhook.url, "https://bot.example.com/telegram");
        assert_eq!(webhook.listen, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(webhook.path, "/telegram");
    }

    #[test]
    fn test_custom_mode_is_kept() {
        let config = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            mode = "else"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.mode, "else");
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = " "
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn test_webhook_mode_requires_section() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"
            mode = "webhook"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("[telegram.webhook]"));
    }

    #[test]
    fn test_webhook_path_must_be_absolute() {
        let err = Config::parse(
            r#"
            [telegram]
            bot_token = "123:abc"

            [telegram.webhook]
            url = "https://bot.example.com/hook"
            path = "hook"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telegram]\nbot_token = \"123:abc\"\npoll_timeout = 5").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.telegram.poll_timeout, 5);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/bottery.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
