use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{error, info};

use crate::config::{HttpConfig, TelegramConfig};
use crate::platform::Messenger;

/// Messaging client backed by the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, http: &HttpConfig) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(http.timeout())
            .connect_timeout(http.connect_timeout())
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            bot: Bot::with_client(&config.bot_token, client),
        })
    }

    /// Point Telegram at our webhook endpoint.
    pub async fn register_webhook(&self, url: &str, secret: Option<&str>) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .with_context(|| format!("Invalid webhook URL: {}", url))?;
        let mut request = self.bot.set_webhook(url.clone());
        if let Some(secret) = secret {
            request = request.secret_token(secret.to_string());
        }
        request.await.context("Failed to register webhook")?;
        info!("Webhook registered at {}", url);
        Ok(())
    }
}

fn log_failure<T, E: std::fmt::Display>(method: &str, result: Result<T, E>) -> Result<T, E> {
    if let Err(e) = &result {
        error!(method, error = %e, "Telegram API error");
    }
    result
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        log_failure(
            "sendMessage",
            self.bot.send_message(ChatId(chat_id), text).await,
        )?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()> {
        log_failure(
            "deleteMessage",
            self.bot
                .delete_message(ChatId(chat_id), MessageId(message_id))
                .await,
        )?;
        Ok(())
    }

    async fn ban_user(&self, chat_id: i64, user_id: u64) -> Result<()> {
        log_failure(
            "banChatMember",
            self.bot
                .ban_chat_member(ChatId(chat_id), UserId(user_id))
                .await,
        )?;
        Ok(())
    }
}
