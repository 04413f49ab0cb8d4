//! HTTP server: router, shared state, and inbox handlers
//!
//! Exposes the four inbox operations as a JSON API. Handlers validate input,
//! orchestrate the mailbox reader, composer, dispatcher, and store, and map
//! failures through [`AppError`]'s response conversion.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::compose::AiClient;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::mailbox::MailboxReader;
use crate::models::{
    AccountQuery, EmailShowResponse, GenerateReplyInput, GenerateReplyResponse, InboxResponse,
    SendReplyInput, SendReplyResponse,
};
use crate::send::MailerService;
use crate::store::ReplyStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config (accounts, transports, signatures)
    config: Arc<AppConfig>,
    /// Inbox read operations
    mailbox: MailboxReader,
    /// Language model client
    composer: AiClient,
    /// Outbound send + draft persistence
    mailer: MailerService,
    /// Reply record repository
    store: ReplyStore,
}

impl AppState {
    /// Wire up the component graph over config and an opened store
    ///
    /// # Errors
    ///
    /// Returns an error when the model HTTP client cannot be constructed.
    pub fn new(config: AppConfig, store: ReplyStore) -> AppResult<Self> {
        let config = Arc::new(config);
        let composer = AiClient::new(&config.ai)?;
        let mailbox = MailboxReader::new(config.clone());
        let mailer = MailerService::new(config.clone(), store.clone());
        Ok(Self {
            config,
            mailbox,
            composer,
            mailer,
            store,
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/inbox", get(list_inbox))
        .route("/inbox/{id}", get(show_email))
        .route("/inbox/{id}/generate-reply", post(generate_reply))
        .route("/inbox/{id}/send-reply", post(send_reply))
        .with_state(state)
}

/// `GET /inbox?account=<id>`: list recent inbox messages
///
/// Provider failures degrade to an empty listing (logged by the reader), so
/// this endpoint only errors on invalid input.
async fn list_inbox(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> AppResult<Json<InboxResponse>> {
    validate_account_id(&query.account)?;
    let emails = state.mailbox.list_inbox(&query.account).await;
    Ok(Json(InboxResponse {
        account: query.account,
        emails,
    }))
}

/// `GET /inbox/{id}?account=<id>`: one email plus its stored reply state
async fn show_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AccountQuery>,
) -> AppResult<Json<EmailShowResponse>> {
    validate_account_id(&query.account)?;
    let email = state
        .mailbox
        .get_message(&query.account, &id)
        .await
        .ok_or_else(|| email_not_found(&id))?;

    let record = state.store.find(&id, &query.account).await?;
    let signature = state.config.signature_for(&query.account).map(str::to_owned);

    Ok(Json(EmailShowResponse {
        account: query.account,
        email,
        latest_reply: record.as_ref().map(|r| r.latest_reply.clone()),
        transcript: record.map(|r| r.transcript).unwrap_or_default(),
        signature,
    }))
}

/// `POST /inbox/{id}/generate-reply?account=<id>`: draft a reply with the model
///
/// Loads the stored transcript, generates the next assistant turn, persists
/// the draft, and returns the updated transcript. Model failures surface as
/// upstream errors; nothing is persisted in that case.
async fn generate_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AccountQuery>,
    Json(input): Json<GenerateReplyInput>,
) -> AppResult<Json<GenerateReplyResponse>> {
    validate_account_id(&query.account)?;
    validate_text(&input.instruction, "instruction")?;

    let email = state
        .mailbox
        .get_message(&query.account, &id)
        .await
        .ok_or_else(|| email_not_found(&id))?;

    let history = state
        .store
        .find(&id, &query.account)
        .await?
        .map(|record| record.transcript)
        .unwrap_or_default();

    let composed = state
        .composer
        .generate_reply(&email, &input.instruction, history)
        .await?;

    state
        .mailer
        .save_draft_reply(&id, &composed.reply, &composed.transcript, &query.account)
        .await?;

    info!(email_id = %id, account = %query.account, "reply draft saved");
    Ok(Json(GenerateReplyResponse {
        account: query.account,
        reply: composed.reply,
        transcript: composed.transcript,
        message: "Reply generated successfully.".to_owned(),
    }))
}

/// `POST /inbox/{id}/send-reply?account=<id>`: send the reply now
///
/// A send failure is a reported condition (`sent: false`), not an HTTP error.
async fn send_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AccountQuery>,
    Json(input): Json<SendReplyInput>,
) -> AppResult<Json<SendReplyResponse>> {
    validate_account_id(&query.account)?;
    validate_text(&input.reply, "reply")?;

    let email = state
        .mailbox
        .get_message(&query.account, &id)
        .await
        .ok_or_else(|| email_not_found(&id))?;

    let sent = state
        .mailer
        .send_reply(
            &email,
            &input.reply,
            input.signature.as_deref(),
            &query.account,
        )
        .await;

    let message = if sent {
        "Reply sent successfully".to_owned()
    } else {
        "Failed to send reply. Please try again.".to_owned()
    };
    Ok(Json(SendReplyResponse {
        account: query.account,
        sent,
        message,
    }))
}

/// Not-found error for an email id
fn email_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("email '{id}' was not found"))
}

/// Validate account id format
fn validate_account_id(account_id: &str) -> AppResult<()> {
    if account_id.is_empty() || account_id.len() > 64 {
        return Err(AppError::InvalidInput(
            "account must be 1..64 characters".to_owned(),
        ));
    }
    if !account_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(AppError::InvalidInput(
            "account must match [A-Za-z0-9_-]+".to_owned(),
        ));
    }
    Ok(())
}

/// Reject empty or whitespace-only text fields
fn validate_text(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::config::{AiConfig, AppConfig};
    use crate::store::ReplyStore;

    use super::{AppState, router, validate_account_id, validate_text};

    /// Config with no reachable accounts; handlers exercise the degraded paths
    fn test_config() -> AppConfig {
        AppConfig {
            accounts: BTreeMap::new(),
            transports: BTreeMap::new(),
            signatures: BTreeMap::new(),
            ai: AiConfig {
                api_url: "https://api.example.com/v1/chat/completions".to_owned(),
                api_key: SecretString::new("test-key".to_owned().into()),
                model: "gpt-4".to_owned(),
                temperature: 0.7,
                timeout_ms: 5_000,
            },
            bind_addr: "127.0.0.1:0".to_owned(),
            database_path: ":memory:".to_owned(),
            connect_timeout_ms: 1_000,
            greeting_timeout_ms: 1_000,
            socket_timeout_ms: 1_000,
            scan_window: 100,
        }
    }

    async fn test_router() -> axum::Router {
        let store = ReplyStore::in_memory().await.expect("store must open");
        let state = AppState::new(test_config(), store).expect("state must build");
        router(state)
    }

    #[test]
    fn account_id_validation_matches_expected_charset() {
        validate_account_id("default").expect("plain id must pass");
        validate_account_id("work_2").expect("underscored id must pass");
        validate_account_id("bad account").expect_err("space must fail");
        validate_account_id("").expect_err("empty must fail");
    }

    #[test]
    fn text_validation_rejects_blank_values() {
        validate_text("reply text", "reply").expect("text must pass");
        validate_text("   ", "reply").expect_err("blank must fail");
    }

    #[tokio::test]
    async fn listing_an_unreachable_account_degrades_to_empty() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/inbox?account=nosuch")
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("handler must respond");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must read");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["account"], "nosuch");
        assert_eq!(body["emails"].as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn invalid_account_is_rejected_with_bad_request() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/inbox?account=bad%20account")
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("handler must respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_email_yields_not_found() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/inbox/12345")
                    .body(Body::empty())
                    .expect("request must build"),
            )
            .await
            .expect("handler must respond");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must read");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["code"], "not_found");
    }

    #[tokio::test]
    async fn blank_instruction_is_rejected_before_any_lookup() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/inbox/42/generate-reply")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"instruction":"  "}"#))
                    .expect("request must build"),
            )
            .await
            .expect("handler must respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn blank_reply_is_rejected_before_any_lookup() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/inbox/42/send-reply")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"reply":""}"#))
                    .expect("request must build"),
            )
            .await
            .expect("handler must respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
