//! Webhook endpoint receiving Telegram updates.
//!
//! The secret-token check gates everything: a request that fails it never
//! reaches the moderation pipeline. Accepted deliveries are handled one at a
//! time.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Router};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::handler::MessageHandler;
use crate::platform::{Messenger, Update};

pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

// ── Shared state ───────────────────────────────────────────────────────────────

pub struct WebhookState {
    handler: MessageHandler,
    messenger: Arc<dyn Messenger>,
    secret: Option<String>,
    /// Serializes deliveries so one message is handled start to finish
    /// before the next.
    processing: Mutex<()>,
}

impl WebhookState {
    pub fn new(
        handler: MessageHandler,
        messenger: Arc<dyn Messenger>,
        secret: Option<String>,
    ) -> Self {
        Self {
            handler,
            messenger,
            secret,
            processing: Mutex::new(()),
        }
    }
}

// ── Routes ─────────────────────────────────────────────────────────────────────

pub fn router(path: &str, state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(path, post(receive_update))
        .with_state(state)
}

async fn receive_update(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let signature = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if signature != secret {
            error!(signature, "Invalid webhook signature");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, input = %body, "Invalid webhook update");
            return StatusCode::OK;
        }
    };

    let Some(message) = update.message else {
        debug!(update_id = ?update.update_id, "Update carries no message, ignoring");
        return StatusCode::OK;
    };

    let _guard = state.processing.lock().await;
    state
        .handler
        .handle(state.messenger.as_ref(), &message)
        .await;

    StatusCode::OK
}

// ── Server ─────────────────────────────────────────────────────────────────────

pub async fn serve(listen: &str, path: &str, state: Arc<WebhookState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind {}", listen))?;

    info!("Listening for webhook updates on http://{}{}", listen, path);

    axum::serve(listener, router(path, state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::checks::contact::ContactRequestDetector;
    use crate::handler::{HandlerDeps, HandlerSettings};
    use crate::llm::MockLanguageModel;
    use crate::platform::MockMessenger;
    use crate::prompt::PromptBuilder;
    use crate::spam::MockSpamChecker;
    use crate::translations::Translations;

    const UPDATE: &str = r#"{
        "update_id": 1,
        "message": {
            "message_id": 2,
            "chat": {"id": 1},
            "from": {"id": 3, "first_name": "Ann"},
            "text": "buy cheap pills"
        }
    }"#;

    fn state(spam_checker: MockSpamChecker, messenger: MockMessenger) -> Arc<WebhookState> {
        let handler = MessageHandler::new(
            HandlerSettings {
                spam_check_enabled: true,
                contact_check_enabled: false,
                spam_strategy: "silent_delete".to_string(),
                specialists_file: "unused.txt".into(),
            },
            HandlerDeps {
                spam_checker: Arc::new(spam_checker),
                llm: Arc::new(MockLanguageModel::new()),
                detector: ContactRequestDetector::new(Vec::new()),
                prompt_builder: PromptBuilder::new("{userMessage}"),
            },
            Translations::default(),
        );
        Arc::new(WebhookState::new(
            handler,
            Arc::new(messenger),
            Some("s3cret".to_string()),
        ))
    }

    fn request(secret: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/webhook");
        if let Some(secret) = secret {
            builder = builder.header(SECRET_HEADER, secret);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_wrong_secret_is_rejected_before_processing() {
        // Mocks without expectations panic if called.
        let app = router("/webhook", state(MockSpamChecker::new(), MockMessenger::new()));

        let response = app
            .clone()
            .oneshot(request(Some("nope"), UPDATE))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app.oneshot(request(None, UPDATE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_update_is_acknowledged_and_ignored() {
        let app = router("/webhook", state(MockSpamChecker::new(), MockMessenger::new()));
        let response = app
            .oneshot(request(Some("s3cret"), "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_without_message_is_ignored() {
        let app = router("/webhook", state(MockSpamChecker::new(), MockMessenger::new()));
        let response = app
            .oneshot(request(Some("s3cret"), r#"{"update_id": 5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_valid_update_reaches_handler() {
        let mut spam_checker = MockSpamChecker::new();
        spam_checker
            .expect_check()
            .withf(|params| params.content == "buy cheap pills" && params.author == "Ann")
            .times(1)
            .returning(|_| Ok(true));

        let mut messenger = MockMessenger::new();
        messenger
            .expect_delete_message()
            .withf(|chat_id, message_id| *chat_id == 1 && *message_id == 2)
            .times(1)
            .returning(|_, _| Ok(()));

        let app = router("/webhook", state(spam_checker, messenger));
        let response = app.oneshot(request(Some("s3cret"), UPDATE)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
