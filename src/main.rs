mod checks;
mod config;
mod context;
mod handler;
mod llm;
mod platform;
mod prompt;
mod spam;
mod specialists;
mod translations;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::checks::ContactRequestDetector;
use crate::config::Config;
use crate::handler::{HandlerDeps, HandlerSettings, MessageHandler};
use crate::llm::GigaChatClient;
use crate::platform::telegram::TelegramClient;
use crate::platform::webhook::{self, WebhookState};
use crate::prompt::PromptBuilder;
use crate::spam::AkismetClient;
use crate::translations::Translations;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,modbot=debug".into()),
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

    let translations = Translations::load(&config.general.translations_dir, &config.general.language)?;

    info!("Configuration loaded successfully");
    info!("  Language: {}", config.general.language);
    info!("  Spam check: {}", config.moderation.spam_check_enabled);
    info!("  Contact check: {}", config.moderation.contact_check_enabled);
    info!("  Data directory: {}", config.data.directory.display());

    // External collaborators
    let http = config.http.build_client()?;
    let spam_checker = AkismetClient::new(config.akismet.clone(), http.clone());
    let llm = GigaChatClient::new(config.gigachat.clone(), http);
    let detector = ContactRequestDetector::load(&config.data.contact_keywords_file());
    info!("  Contact patterns: {}", detector.len());
    if config.moderation.contact_check_enabled && detector.is_empty() {
        warn!("Contact check is enabled but no contact patterns are loaded");
    }
    let prompt_builder = PromptBuilder::new(config.gigachat.prompt_template.clone());

    let handler = MessageHandler::new(
        HandlerSettings {
            spam_check_enabled: config.moderation.spam_check_enabled,
            contact_check_enabled: config.moderation.contact_check_enabled,
            spam_strategy: config.moderation.spam_strategy.clone(),
            specialists_file: config.data.specialists_file(),
        },
        HandlerDeps {
            spam_checker: Arc::new(spam_checker),
            llm: Arc::new(llm),
            detector,
            prompt_builder,
        },
        translations,
    );
    info!("  Spam strategy: {}", handler.strategy().name());

    let telegram = TelegramClient::new(&config.telegram, &config.http)?;
    if let Some(url) = &config.telegram.webhook_url {
        telegram
            .register_webhook(url, config.webhook_secret())
            .await?;
    }

    let state = Arc::new(WebhookState::new(
        handler,
        Arc::new(telegram),
        config.webhook_secret().map(str::to_string),
    ));

    info!("Bot is starting...");
    webhook::serve(&config.server.listen, &config.server.path, state).await?;

    Ok(())
}
