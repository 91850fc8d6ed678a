use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::GigaChatConfig;

/// Tokens this close to expiry are refreshed before use.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 1800;

/// Answer used when the completion carries no message content.
pub const EMPTY_RESPONSE_TEXT: &str = "GigaChat response error";

/// Language model answering contact-request prompts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Epoch milliseconds.
    #[serde(default)]
    expires_at: Option<i64>,
    /// Seconds from now.
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if let Some(at) = self.expires_at.and_then(DateTime::from_timestamp_millis) {
            return at;
        }
        let lifetime = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        now + TimeDelta::seconds(lifetime)
    }
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at >= now + TimeDelta::seconds(TOKEN_REFRESH_MARGIN_SECS)
    }
}

/// Pull the answer out of a completion body, falling back to a fixed text.
fn answer_from(body: &str) -> String {
    serde_json::from_str::<ChatResponse>(body)
        .ok()
        .and_then(|r| r.choices.into_iter().next())
        .and_then(|c| c.message.content)
        .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string())
}

pub struct GigaChatClient {
    client: reqwest::Client,
    config: GigaChatConfig,
    /// Cached OAuth token; the lock is held across check-and-refresh.
    token: Mutex<Option<AccessToken>>,
}

impl GigaChatClient {
    pub fn new(config: GigaChatConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            config,
            token: Mutex::new(None),
        }
    }

    /// Current access token, refreshed when missing or about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.request_token().await.inspect_err(|e| {
            let detail = format!("{:#}", e);
            error!(error = %detail, "GigaChat token refresh error");
        })?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let response = self
            .client
            .post(&self.config.auth_url)
            .header("Accept", "application/json")
            .header("RqUID", uuid::Uuid::new_v4().to_string())
            .header(
                "Authorization",
                format!("Basic {}", BASE64.encode(&self.config.auth_key)),
            )
            .form(&[("scope", self.config.scope.as_str())])
            .send()
            .await
            .context("Failed to obtain GigaChat access token")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Failed to obtain GigaChat access token ({}): {}",
                status,
                error_body
            );
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to obtain GigaChat access token")?;
        let expires_at = token.expiry(Utc::now());
        info!("GigaChat access token refreshed, expires at {}", expires_at);

        Ok(AccessToken {
            value: token.access_token,
            expires_at,
        })
    }

    async fn complete(&self, token: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt.to_string()),
            }],
        };

        let url = format!("{}/chat/completions", self.config.api_url);

        debug!("Sending request to GigaChat: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to GigaChat")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read GigaChat response")?;
        if !status.is_success() {
            anyhow::bail!("GigaChat API error ({}): {}", status, body);
        }

        Ok(answer_from(&body))
    }
}

#[async_trait]
impl LanguageModel for GigaChatClient {
    async fn ask(&self, prompt: &str) -> Result<String> {
        let token = self.access_token().await?;

        self.complete(&token, prompt)
            .await
            .inspect_err(|e| {
                let detail = format!("{:#}", e);
                error!(error = %detail, "GigaChat API error");
            })
            .context("Failed to process GigaChat request")
    }
}
