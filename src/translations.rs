use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// User-visible replies and log messages for one language.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Translations {
    /// Warning sent to the chat when spam is detected.
    #[serde(default = "default_spam_message")]
    pub spam_message: String,
    /// Generic reply sent when processing a message fails.
    #[serde(default = "default_error_message")]
    pub error_message: String,
    #[serde(default = "default_log_spam_detected")]
    pub log_spam_detected: String,
    #[serde(default = "default_log_contact_processed")]
    pub log_contact_processed: String,
    #[serde(default = "default_log_message_error")]
    pub log_message_error: String,
    /// `{strategy}` is replaced with the strategy name.
    #[serde(default = "default_log_spam_handled")]
    pub log_spam_handled: String,
}

fn default_spam_message() -> String {
    "Your message looks like spam.".to_string()
}

fn default_error_message() -> String {
    "An error occurred. Please try again later.".to_string()
}

fn default_log_spam_detected() -> String {
    "Spam detected".to_string()
}

fn default_log_contact_processed() -> String {
    "Contact request processed".to_string()
}

fn default_log_message_error() -> String {
    "Message processing error".to_string()
}

fn default_log_spam_handled() -> String {
    "Spam handled: {strategy}".to_string()
}

impl Default for Translations {
    fn default() -> Self {
        Self {
            spam_message: default_spam_message(),
            error_message: default_error_message(),
            log_spam_detected: default_log_spam_detected(),
            log_contact_processed: default_log_contact_processed(),
            log_message_error: default_log_message_error(),
            log_spam_handled: default_log_spam_handled(),
        }
    }
}

impl Translations {
    /// Load `<dir>/<language>.toml`. A missing file is an error.
    pub fn load(dir: &Path, language: &str) -> Result<Self> {
        let path = dir.join(format!("{}.toml", language));
        let content = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "Translation file for language '{}' not found: {}",
                language,
                path.display()
            )
        })?;
        let translations: Translations = toml::from_str(&content)
            .with_context(|| format!("Failed to parse translation file: {}", path.display()))?;
        info!("Loaded translations for '{}'", language);
        Ok(translations)
    }
}
