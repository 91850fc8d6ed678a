pub mod telegram;
pub mod webhook;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Platform actions the moderation pipeline can take.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<()>;

    async fn ban_user(&self, chat_id: i64, user_id: u64) -> Result<()>;
}

/// A webhook update. Only `message` updates are moderated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
}

/// A message as delivered by the webhook.
///
/// Every field is optional: whether a message is actionable is decided by
/// [`crate::context::MessageContext::from_message`], not by deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub message_id: Option<i32>,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<Sender>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl InboundMessage {
    /// Author name for spam scoring: username, then first name, then empty.
    pub fn author(&self) -> String {
        self.from
            .as_ref()
            .and_then(|f| f.username.clone().or_else(|| f.first_name.clone()))
            .unwrap_or_default()
    }
}
