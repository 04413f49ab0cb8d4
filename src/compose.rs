//! Reply composer: language model calls and transcript management
//!
//! Builds the conversation transcript for an email, submits it to an
//! OpenAI-compatible chat completions endpoint, and appends the assistant
//! reply. The transcript is append-only and replayed in full on every call;
//! a failed remote call never yields a partial transcript.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::config::AiConfig;
use crate::errors::{AppError, AppResult};
use crate::models::{ConversationTurn, EmailDetail, Transcript};

/// Fixed system instruction seeding every transcript
const SYSTEM_PROMPT: &str = "You are an email assistant that helps the user craft replies. \
The user will provide you with an email to respond to and specific instructions on how to \
craft the reply. Generate a professional and appropriate response according to the user's \
instructions.";

/// A generated reply together with the updated transcript
#[derive(Debug, Clone)]
pub struct ComposedReply {
    /// The assistant's reply text
    pub reply: String,
    /// The transcript including the new instruction and assistant turns
    pub transcript: Transcript,
}

/// Chat completions response shape (only the fields we read)
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Language model client
///
/// Thin wrapper over `reqwest` with bearer authentication and a bounded
/// request timeout. Model selection and sampling temperature are fixed at
/// construction from config.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_url: String,
    model: String,
    temperature: f32,
}

impl AiClient {
    /// Create a client with default auth headers and request timeout
    ///
    /// # Errors
    ///
    /// Returns `Internal` when the API key is not a valid header value or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &AiConfig) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
                .map_err(|_| AppError::Internal("invalid model API key format".to_owned()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to create model HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Generate the next assistant reply for an email
    ///
    /// Seeds an empty transcript with the system instruction and an email
    /// context turn, appends the instruction, submits the full turn sequence,
    /// and appends the assistant reply on success.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` carrying the provider status and body on transport
    /// failure or a non-2xx response. The caller's stored transcript is left
    /// untouched in that case.
    pub async fn generate_reply(
        &self,
        email: &EmailDetail,
        instruction: &str,
        transcript: Transcript,
    ) -> AppResult<ComposedReply> {
        let transcript = prepare_request(email, instruction, transcript);
        debug!(turns = transcript.len(), model = %self.model, "submitting transcript");

        let body = json!({
            "model": self.model,
            "messages": &transcript,
            "temperature": self.temperature,
        });

        let response = self
            .http
            .post(&self.api_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "provider returned {status}: {detail}"
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("unreadable provider response: {e}")))?;
        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        info!(chars = reply.len(), "reply generated");
        Ok(ComposedReply {
            transcript: finish_exchange(transcript, &reply),
            reply,
        })
    }
}

/// Build the turn sequence submitted to the model
///
/// An empty transcript is seeded with the system instruction and a user turn
/// summarizing the email; the new instruction is always appended last. Prior
/// turns are never modified.
fn prepare_request(email: &EmailDetail, instruction: &str, mut transcript: Transcript) -> Transcript {
    if transcript.is_empty() {
        transcript.push(ConversationTurn::system(SYSTEM_PROMPT));
        transcript.push(ConversationTurn::user(email_context(email)));
    }
    transcript.push(ConversationTurn::user(instruction));
    transcript
}

/// Append the assistant reply as the final turn
fn finish_exchange(mut transcript: Transcript, reply: &str) -> Transcript {
    transcript.push(ConversationTurn::assistant(reply));
    transcript
}

/// User turn summarizing the email being replied to
fn email_context(email: &EmailDetail) -> String {
    format!(
        "I need to reply to this email:\n\nFrom: {}\nSubject: {}\nDate: {}\n\n{}",
        email.from,
        email.subject,
        email.date.as_deref().unwrap_or(""),
        email.body
    )
}

#[cfg(test)]
mod tests {
    use crate::models::{ConversationTurn, EmailDetail, Role};

    use super::{email_context, finish_exchange, prepare_request};

    fn email() -> EmailDetail {
        EmailDetail {
            id: "42".to_owned(),
            subject: "Meeting notes".to_owned(),
            from: "sender@example.com".to_owned(),
            to: "me@example.com".to_owned(),
            date: Some("2025-01-01T00:00:00+00:00".to_owned()),
            body: "Please find the notes attached.".to_owned(),
            html: None,
            message_id: "<m@example.com>".to_owned(),
        }
    }

    #[test]
    fn empty_transcript_yields_four_turns_in_order() {
        let prepared = prepare_request(&email(), "Reply politely.", Vec::new());
        let transcript = finish_exchange(prepared, "Thank you for the notes.");

        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[0].role, Role::System);
        assert_eq!(transcript[1].role, Role::User);
        assert!(transcript[1].content.contains("From: sender@example.com"));
        assert!(transcript[1].content.contains("Subject: Meeting notes"));
        assert_eq!(transcript[2].role, Role::User);
        assert_eq!(transcript[2].content, "Reply politely.");
        assert_eq!(transcript[3].role, Role::Assistant);
        assert_eq!(transcript[3].content, "Thank you for the notes.");
    }

    #[test]
    fn existing_transcript_gains_exactly_two_turns() {
        let existing = vec![
            ConversationTurn::system("sys"),
            ConversationTurn::user("context"),
            ConversationTurn::user("first instruction"),
            ConversationTurn::assistant("first reply"),
        ];

        let prepared = prepare_request(&email(), "Make it shorter.", existing.clone());
        let transcript = finish_exchange(prepared, "Short reply.");

        assert_eq!(transcript.len(), existing.len() + 2);
        assert_eq!(&transcript[..existing.len()], &existing[..]);
        assert_eq!(transcript[existing.len()].content, "Make it shorter.");
        assert_eq!(transcript[existing.len() + 1].role, Role::Assistant);
    }

    #[test]
    fn email_context_includes_headers_and_body() {
        let context = email_context(&email());
        assert!(context.starts_with("I need to reply to this email:"));
        assert!(context.contains("Date: 2025-01-01T00:00:00+00:00"));
        assert!(context.ends_with("Please find the notes attached."));
    }
}
