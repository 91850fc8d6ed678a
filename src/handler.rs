use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, info_span, warn, Instrument};

use crate::checks::{ContactRequestDetector, SpamStrategy};
use crate::context::MessageContext;
use crate::llm::LanguageModel;
use crate::platform::{InboundMessage, Messenger};
use crate::prompt::PromptBuilder;
use crate::spam::{SpamCheck, SpamChecker};
use crate::specialists;
use crate::translations::Translations;

/// Switches and paths the pipeline reads from configuration.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub spam_check_enabled: bool,
    pub contact_check_enabled: bool,
    /// Strategy name; unknown names resolve to `delete_ban`.
    pub spam_strategy: String,
    pub specialists_file: PathBuf,
}

/// Collaborators the pipeline calls into.
pub struct HandlerDeps {
    pub spam_checker: Arc<dyn SpamChecker>,
    pub llm: Arc<dyn LanguageModel>,
    pub detector: ContactRequestDetector,
    pub prompt_builder: PromptBuilder,
}

/// Runs the moderation pipeline for one message: spam check, then contact
/// request check. Any failure ends in a generic reply to the chat.
pub struct MessageHandler {
    settings: HandlerSettings,
    deps: HandlerDeps,
    strategy: SpamStrategy,
    translations: Translations,
}

impl MessageHandler {
    pub fn new(settings: HandlerSettings, deps: HandlerDeps, translations: Translations) -> Self {
        let strategy = SpamStrategy::from_name(&settings.spam_strategy, &translations.spam_message);
        Self {
            settings,
            deps,
            strategy,
            translations,
        }
    }

    pub fn strategy(&self) -> &SpamStrategy {
        &self.strategy
    }

    /// Moderate one inbound message. Never fails: errors are logged and
    /// answered with the generic error text.
    pub async fn handle(&self, messenger: &dyn Messenger, message: &InboundMessage) {
        let Some(context) = MessageContext::from_message(message) else {
            return;
        };

        let span = info_span!(
            "message",
            chat_id = context.chat_id,
            message_id = context.message_id,
            user_id = context.user_id
        );

        async {
            if let Err(e) = self.process(messenger, message, &context).await {
                self.report_failure(messenger, &context, &e).await;
            }
        }
        .instrument(span)
        .await
    }

    async fn process(
        &self,
        messenger: &dyn Messenger,
        message: &InboundMessage,
        context: &MessageContext,
    ) -> Result<()> {
        if self.settings.spam_check_enabled {
            let params = SpamCheck::new(context.text.as_str(), message.author());
            if self.deps.spam_checker.check(&params).await? {
                warn!(
                    text = %context.text,
                    strategy = self.strategy.name(),
                    "{}",
                    self.translations.log_spam_detected
                );
                self.strategy
                    .handle(messenger, context, &self.translations.log_spam_handled)
                    .await?;
                return Ok(());
            }
        }

        if self.settings.contact_check_enabled
            && self.deps.detector.is_contact_request(&context.text)
        {
            let specialists = specialists::load(&self.settings.specialists_file).await?;
            let prompt = self.deps.prompt_builder.build(&context.text, &specialists);
            let answer = self.deps.llm.ask(&prompt).await?;
            messenger.send_message(context.chat_id, &answer).await?;
            info!(
                text = %context.text,
                response = %answer,
                "{}",
                self.translations.log_contact_processed
            );
            return Ok(());
        }

        Ok(())
    }

    async fn report_failure(
        &self,
        messenger: &dyn Messenger,
        context: &MessageContext,
        err: &anyhow::Error,
    ) {
        let detail = format!("{:#}", err);
        error!(
            text = %context.text,
            error = %detail,
            "{}",
            self.translations.log_message_error
        );

        // The error reply is best effort; its own failure is only logged.
        if let Err(e) = messenger
            .send_message(context.chat_id, &self.translations.error_message)
            .await
        {
            let detail = format!("{:#}", e);
            error!(error = %detail, "Failed to send error reply");
        }
    }
}
