//! Domain types and HTTP request/response DTOs
//!
//! Defines the normalized email representations produced by the mailbox
//! reader, the conversation transcript exchanged with the language model,
//! the persisted reply record, and the JSON bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject placeholder when a message carries none
pub const NO_SUBJECT: &str = "No Subject";
/// Address placeholder when a sender/recipient cannot be parsed
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Lightweight message representation for inbox listings
///
/// Every field is a plain string (or absent); provider-internal types never
/// cross this boundary. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSummary {
    /// Provider-assigned identifier, treated as opaque
    pub id: String,
    /// Subject line (placeholder when absent)
    pub subject: String,
    /// Bare sender address (placeholder when unparseable)
    pub from: String,
    /// ISO-8601 timestamp, or absent when the Date header is missing
    pub date: Option<String>,
    /// Protocol Message-ID, possibly empty
    pub message_id: String,
}

/// Full message representation for the single-message view
///
/// Extends the summary fields with recipient, plain-text body, and an
/// optional sanitized HTML body. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailDetail {
    /// Provider-assigned identifier, treated as opaque
    pub id: String,
    /// Subject line (placeholder when absent)
    pub subject: String,
    /// Bare sender address (placeholder when unparseable)
    pub from: String,
    /// Bare recipient address (placeholder when unparseable)
    pub to: String,
    /// ISO-8601 timestamp, or absent when the Date header is missing
    pub date: Option<String>,
    /// Plain-text body (derived from HTML when no text part exists)
    pub body: String,
    /// Sanitized HTML body, if the message had one
    pub html: Option<String>,
    /// Protocol Message-ID, possibly empty
    pub message_id: String,
}

/// Speaker tag for a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed assistant instruction, first turn of every transcript
    System,
    /// Email context or user instruction
    User,
    /// Model output
    Assistant,
}

/// One role-tagged turn of the model conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Speaker tag
    pub role: Role,
    /// Turn text
    pub content: String,
}

impl ConversationTurn {
    /// Build a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, chronologically ordered conversation history
///
/// Replayed verbatim to the model on every reply-generation call; turns are
/// never edited or removed.
pub type Transcript = Vec<ConversationTurn>;

/// Persisted draft/sent reply, keyed by (email id, account)
///
/// Owned exclusively by the reply store; the composer and dispatcher only
/// read and write it through store operations.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRecord {
    /// Email identifier the reply belongs to
    pub email_id: String,
    /// Logical account the reply belongs to
    pub account: String,
    /// Latest draft or sent reply text
    pub latest_reply: String,
    /// Full conversation transcript
    pub transcript: Transcript,
    /// Set exactly once on a confirmed send; absent while a draft
    pub sent_at: Option<DateTime<Utc>>,
}

/// Query string shared by all inbox routes
#[derive(Debug, Clone, Deserialize)]
pub struct AccountQuery {
    /// Account identifier (defaults to `"default"`)
    #[serde(default = "default_account_id")]
    pub account: String,
}

/// Input: generate a reply draft
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateReplyInput {
    /// Free-text instruction for the model
    pub instruction: String,
}

/// Input: send a reply
#[derive(Debug, Clone, Deserialize)]
pub struct SendReplyInput {
    /// Reply text to send
    pub reply: String,
    /// Optional signature override (configured signature used when absent)
    pub signature: Option<String>,
}

/// Response: inbox listing
#[derive(Debug, Clone, Serialize)]
pub struct InboxResponse {
    /// Account the listing belongs to
    pub account: String,
    /// Message summaries, in the account's configured order
    pub emails: Vec<EmailSummary>,
}

/// Response: single email with its stored reply state
#[derive(Debug, Clone, Serialize)]
pub struct EmailShowResponse {
    /// Account the email belongs to
    pub account: String,
    /// Normalized email detail
    pub email: EmailDetail,
    /// Latest stored draft/sent reply, if any
    pub latest_reply: Option<String>,
    /// Stored conversation transcript (empty when none)
    pub transcript: Transcript,
    /// Signature that would be appended on send, if configured
    pub signature: Option<String>,
}

/// Response: reply generation result
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReplyResponse {
    /// Account the email belongs to
    pub account: String,
    /// Newly generated reply text
    pub reply: String,
    /// Updated conversation transcript
    pub transcript: Transcript,
    /// Human-readable outcome message
    pub message: String,
}

/// Response: send outcome
#[derive(Debug, Clone, Serialize)]
pub struct SendReplyResponse {
    /// Account the email belongs to
    pub account: String,
    /// Whether the relay accepted the message
    pub sent: bool,
    /// Human-readable outcome message
    pub message: String,
}

/// Default value for `account` query fields
pub fn default_account_id() -> String {
    "default".to_owned()
}

#[cfg(test)]
mod tests {
    use super::{ConversationTurn, Role, Transcript};

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let turn = ConversationTurn::assistant("Sounds good.");
        let json = serde_json::to_string(&turn).expect("turn must serialize");
        assert_eq!(json, r#"{"role":"assistant","content":"Sounds good."}"#);
    }

    #[test]
    fn transcript_round_trips_identically() {
        let transcript: Transcript = vec![
            ConversationTurn::system("You are a helpful email assistant."),
            ConversationTurn::user("I need to reply to this email."),
            ConversationTurn::user("Keep it short."),
            ConversationTurn::assistant("Sure, here is a short reply."),
        ];

        let json = serde_json::to_string(&transcript).expect("transcript must serialize");
        let back: Transcript = serde_json::from_str(&json).expect("transcript must deserialize");
        assert_eq!(back, transcript);
        assert_eq!(back[0].role, Role::System);
        assert_eq!(back.last().map(|t| t.role), Some(Role::Assistant));
    }
}
