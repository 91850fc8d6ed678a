use anyhow::Result;
use tracing::info;

use crate::context::MessageContext;
use crate::platform::Messenger;

/// Reaction to a message confirmed as spam.
///
/// Each variant issues its platform calls in a fixed order (warn, delete,
/// ban). Calls are independent: a failure stops the remaining ones but does
/// not undo those already made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamStrategy {
    /// Post a warning only.
    Warn { warning: String },
    /// Post a warning, then delete the message.
    WarnDelete { warning: String },
    /// Delete the message without a word.
    SilentDelete,
    /// Post a warning, delete the message, ban the sender.
    DeleteBan { warning: String },
}

impl SpamStrategy {
    /// Resolve a configured strategy name. Unknown names get the most
    /// restrictive strategy, `delete_ban`.
    pub fn from_name(name: &str, warning: impl Into<String>) -> Self {
        let warning = warning.into();
        match name {
            "warn" => Self::Warn { warning },
            "warn_delete" => Self::WarnDelete { warning },
            "silent_delete" => Self::SilentDelete,
            _ => Self::DeleteBan { warning },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Warn { .. } => "warn",
            Self::WarnDelete { .. } => "warn_delete",
            Self::SilentDelete => "silent_delete",
            Self::DeleteBan { .. } => "delete_ban",
        }
    }

    /// Apply the strategy, then log `log_message` with `{strategy}` filled in.
    pub async fn handle(
        &self,
        messenger: &dyn Messenger,
        context: &MessageContext,
        log_message: &str,
    ) -> Result<()> {
        match self {
            Self::Warn { warning } => {
                messenger.send_message(context.chat_id, warning).await?;
            }
            Self::WarnDelete { warning } => {
                messenger.send_message(context.chat_id, warning).await?;
                messenger
                    .delete_message(context.chat_id, context.message_id)
                    .await?;
            }
            Self::SilentDelete => {
                messenger
                    .delete_message(context.chat_id, context.message_id)
                    .await?;
            }
            Self::DeleteBan { warning } => {
                messenger.send_message(context.chat_id, warning).await?;
                messenger
                    .delete_message(context.chat_id, context.message_id)
                    .await?;
                messenger.ban_user(context.chat_id, context.user_id).await?;
            }
        }

        info!(
            strategy = self.name(),
            chat_id = context.chat_id,
            message_id = context.message_id,
            user_id = context.user_id,
            text = %context.text,
            "{}",
            log_message.replace("{strategy}", self.name())
        );
        Ok(())
    }
}
