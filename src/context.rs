use crate::platform::InboundMessage;

/// Identifying fields of one inbound message, threaded through the
/// moderation pipeline for strategy dispatch and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    pub chat_id: i64,
    pub message_id: i32,
    pub user_id: u64,
    pub text: String,
}

impl MessageContext {
    /// Build a context from a webhook message.
    ///
    /// Returns `None` when the text is missing or empty, or when any of the
    /// chat, message or sender ids is missing or zero. Such messages are not
    /// actionable and are dropped without a trace.
    pub fn from_message(message: &InboundMessage) -> Option<Self> {
        let text = message.text.as_deref().filter(|t| !t.is_empty())?;
        let chat_id = message
            .chat
            .as_ref()
            .and_then(|c| c.id)
            .filter(|id| *id != 0)?;
        let message_id = message.message_id.filter(|id| *id != 0)?;
        let user_id = message
            .from
            .as_ref()
            .and_then(|f| f.id)
            .filter(|id| *id != 0)?;

        Some(Self {
            chat_id,
            message_id,
            user_id,
            text: text.to_string(),
        })
    }
}
