use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::AkismetConfig;

/// Source address sent to the scorer; webhook deliveries carry no client IP.
pub const PLACEHOLDER_ADDRESS: &str = "0.0.0.0";

/// Parameters of one spam-scoring call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamCheck {
    pub content: String,
    pub author: String,
    pub source_address: String,
}

impl SpamCheck {
    pub fn new(content: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: author.into(),
            source_address: PLACEHOLDER_ADDRESS.to_string(),
        }
    }
}

/// External spam classifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpamChecker: Send + Sync {
    /// `true` when the content is spam.
    async fn check(&self, params: &SpamCheck) -> Result<bool>;
}

pub struct AkismetClient {
    client: reqwest::Client,
    config: AkismetConfig,
}

impl AkismetClient {
    pub fn new(config: AkismetConfig, client: reqwest::Client) -> Self {
        Self { client, config }
    }

    async fn comment_check(&self, params: &SpamCheck) -> Result<bool> {
        let form = [
            ("api_key", self.config.api_key.as_str()),
            ("blog", self.config.blog_url.as_str()),
            ("user_ip", params.source_address.as_str()),
            ("comment_content", params.content.as_str()),
            ("comment_author", params.author.as_str()),
        ];

        debug!("Sending comment-check to Akismet: {}", self.config.api_url);

        let response = self
            .client
            .post(&self.config.api_url)
            .form(&form)
            .send()
            .await
            .context("Failed to send request to Akismet")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read Akismet response")?;
        if !status.is_success() {
            anyhow::bail!("Akismet API error ({}): {}", status, body);
        }

        parse_verdict(&body)
    }
}

/// Akismet answers with a bare `true` or `false`; anything else means the
/// request was not understood.
fn parse_verdict(body: &str) -> Result<bool> {
    match body.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => {
            error!(response = other, "Unexpected Akismet response");
            anyhow::bail!("Invalid Akismet response")
        }
    }
}

#[async_trait]
impl SpamChecker for AkismetClient {
    async fn check(&self, params: &SpamCheck) -> Result<bool> {
        self.comment_check(params).await.inspect_err(|e| {
            let detail = format!("{:#}", e);
            error!(error = %detail, "Akismet API error");
        })
    }
}
