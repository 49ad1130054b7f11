//! Telegram Bot API notifier.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::{NotifyError, Notifier};

/// Default base URL for the Telegram Bot API.
const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Configuration for the Telegram notifier.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Direct chat that always receives alerts
    pub chat_id: String,
    /// Optional broadcast channel
    pub channel_id: Option<String>,
    /// Base URL for the API
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            channel_id: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set a custom base URL (for testing).
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends alerts to a chat and, optionally, a channel.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    http: reqwest::Client,
    send_url: String,
    destinations: Vec<String>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let mut destinations = vec![config.chat_id];
        destinations.extend(config.channel_id);

        Ok(Self {
            http,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.api_base_url, config.bot_token
            ),
            destinations,
        })
    }

    /// Chat ids that receive each alert, primary chat first.
    pub fn destinations(&self) -> &[String] {
        &self.destinations
    }

    async fn send_to(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: "Markdown",
        };

        // The URL embeds the bot token; keep it out of error messages.
        let response = self
            .http
            .post(&self.send_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        match serde_json::from_str::<ApiResponse>(&text) {
            Ok(api) if status.is_success() && api.ok => Ok(()),
            Ok(api) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: api.description.unwrap_or_default(),
            }),
            Err(_) => Err(NotifyError::Api {
                status: status.as_u16(),
                description: text.chars().take(200).collect(),
            }),
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<usize, NotifyError> {
        let mut delivered = 0;

        for chat_id in &self.destinations {
            match self.send_to(chat_id, message).await {
                Ok(()) => {
                    delivered += 1;
                    info!(chat_id = %chat_id, "telegram notification sent");
                }
                Err(e) => {
                    error!(chat_id = %chat_id, error = %e, "telegram notification failed");
                }
            }
        }

        if delivered == 0 {
            return Err(NotifyError::Undelivered {
                attempted: self.destinations.len(),
            });
        }

        Ok(delivered)
    }
}
