use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    pub akismet: AkismetConfig,
    pub gigachat: GigaChatConfig,
    #[serde(default = "default_moderation_config")]
    pub moderation: ModerationConfig,
    #[serde(default = "default_data_config")]
    pub data: DataConfig,
    #[serde(default = "default_http_config")]
    pub http: HttpConfig,
    #[serde(default = "default_general_config")]
    pub general: GeneralConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Expected value of the `X-Telegram-Bot-Api-Secret-Token` header.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Public URL registered with `setWebhook` on startup, if set.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_webhook_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AkismetConfig {
    pub api_key: String,
    pub blog_url: String,
    #[serde(default = "default_akismet_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GigaChatConfig {
    pub auth_key: String,
    #[serde(default = "default_gigachat_scope")]
    pub scope: String,
    #[serde(default = "default_gigachat_api_url")]
    pub api_url: String,
    #[serde(default = "default_gigachat_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_gigachat_model")]
    pub model: String,
    /// Template with `{userMessage}` and `{specialistsText}` placeholders.
    pub prompt_template: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModerationConfig {
    #[serde(default = "default_true")]
    pub spam_check_enabled: bool,
    #[serde(default = "default_true")]
    pub contact_check_enabled: bool,
    /// One of `warn`, `warn_delete`, `silent_delete`, `delete_ban`.
    #[serde(default = "default_spam_strategy")]
    pub spam_strategy: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub directory: PathBuf,
}

impl DataConfig {
    pub fn specialists_file(&self) -> PathBuf {
        self.directory.join("specialists.txt")
    }

    pub fn contact_keywords_file(&self) -> PathBuf {
        self.directory.join("contact_keywords.txt")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: f64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs_f64(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout_secs)
    }

    /// Plain reqwest client carrying the configured timeouts.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .connect_timeout(self.connect_timeout())
            .build()
            .context("Failed to build HTTP client")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_translations_dir")]
    pub translations_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

fn default_akismet_api_url() -> String {
    "https://rest.akismet.com/1.1/comment-check".to_string()
}

fn default_gigachat_scope() -> String {
    "GIGACHAT_API_PERS".to_string()
}

fn default_gigachat_api_url() -> String {
    "https://gigachat.devices.sberbank.ru/api/v1".to_string()
}

fn default_gigachat_auth_url() -> String {
    "https://ngw.devices.sberbank.ru:9443/api/v2/oauth".to_string()
}

fn default_gigachat_model() -> String {
    "GigaChat".to_string()
}

fn default_spam_strategy() -> String {
    "delete_ban".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_timeout_secs() -> f64 {
    5.0
}

fn default_connect_timeout_secs() -> f64 {
    2.0
}

fn default_language() -> String {
    "en".to_string()
}

fn default_translations_dir() -> PathBuf {
    PathBuf::from("translations")
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        listen: default_listen(),
        path: default_webhook_path(),
    }
}

fn default_moderation_config() -> ModerationConfig {
    ModerationConfig {
        spam_check_enabled: true,
        contact_check_enabled: true,
        spam_strategy: default_spam_strategy(),
    }
}

fn default_data_config() -> DataConfig {
    DataConfig {
        directory: default_data_dir(),
    }
}

fn default_http_config() -> HttpConfig {
    HttpConfig {
        timeout_secs: default_timeout_secs(),
        connect_timeout_secs: default_connect_timeout_secs(),
    }
}

fn default_general_config() -> GeneralConfig {
    GeneralConfig {
        language: default_language(),
        translations_dir: default_translations_dir(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects blank required values, unusable timeouts and a relative
    /// webhook path.
    fn validate(&self) -> Result<()> {
        let required = [
            ("telegram.bot_token", &self.telegram.bot_token),
            ("akismet.api_key", &self.akismet.api_key),
            ("akismet.blog_url", &self.akismet.blog_url),
            ("akismet.api_url", &self.akismet.api_url),
            ("gigachat.auth_key", &self.gigachat.auth_key),
            ("gigachat.scope", &self.gigachat.scope),
            ("gigachat.api_url", &self.gigachat.api_url),
            ("gigachat.auth_url", &self.gigachat.auth_url),
            ("gigachat.model", &self.gigachat.model),
            ("gigachat.prompt_template", &self.gigachat.prompt_template),
            ("general.language", &self.general.language),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("Missing required configuration value: {}", key);
            }
        }
        let timeouts = [
            ("http.timeout_secs", self.http.timeout_secs),
            ("http.connect_timeout_secs", self.http.connect_timeout_secs),
        ];
        for (key, secs) in timeouts {
            if !secs.is_finite() || secs <= 0.0 {
                anyhow::bail!("{} must be a positive number of seconds, got {}", key, secs);
            }
        }
        if !self.server.path.starts_with('/') {
            anyhow::bail!(
                "server.path must start with '/', got '{}'",
                self.server.path
            );
        }
        Ok(())
    }

    /// Webhook secret, treating an empty string as unset.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.telegram
            .webhook_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }
}
