//! Reply dispatcher: outbound SMTP delivery and draft persistence
//!
//! Formats the outgoing reply (subject prefixing, signature, HTML rendering),
//! resolves the logical account to an SMTP transport, and sends through
//! `lettre`. A sent record is persisted only after the relay accepts the
//! message; send failures are logged and reported as a boolean, never raised.

use std::sync::Arc;
use std::time::Duration;

use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{error, info};

use crate::config::{AppConfig, SmtpConfig, SmtpEncryption};
use crate::errors::{AppError, AppResult};
use crate::models::{EmailDetail, ReplyRecord, Transcript};
use crate::store::ReplyStore;

/// Outbound reply operations
#[derive(Clone)]
pub struct MailerService {
    config: Arc<AppConfig>,
    store: ReplyStore,
}

impl MailerService {
    /// Create a dispatcher over the shared configuration and reply store
    pub fn new(config: Arc<AppConfig>, store: ReplyStore) -> Self {
        Self { config, store }
    }

    /// Send a reply to the original sender
    ///
    /// The subject gains a `Re: ` prefix unless one is already present, the
    /// signature (override, else account config, else `default`) is appended
    /// once, and the body is sent as multipart/alternative with a minimally
    /// escaped HTML rendering. `In-Reply-To` and `References` point at the
    /// original Message-ID when known.
    ///
    /// Returns whether the relay accepted the message. On success the sent
    /// record is persisted; on failure nothing is written.
    pub async fn send_reply(
        &self,
        email: &EmailDetail,
        reply_text: &str,
        signature_override: Option<&str>,
        account_id: &str,
    ) -> bool {
        match self
            .send_reply_impl(email, reply_text, signature_override, account_id)
            .await
        {
            Ok(sent_body) => {
                if let Err(e) = self.store.mark_sent(&email.id, account_id, &sent_body).await {
                    error!(email_id = %email.id, account = account_id, error = %e,
                        "reply sent but recording it failed");
                }
                info!(email_id = %email.id, account = account_id, to = %email.from, "reply sent");
                true
            }
            Err(e) => {
                error!(email_id = %email.id, account = account_id, error = %e,
                    "failed to send email reply");
                false
            }
        }
    }

    async fn send_reply_impl(
        &self,
        email: &EmailDetail,
        reply_text: &str,
        signature_override: Option<&str>,
        account_id: &str,
    ) -> AppResult<String> {
        let subject = format_reply_subject(&email.subject);
        let signature = signature_override
            .or_else(|| self.config.signature_for(account_id))
            .unwrap_or("");
        let body = append_signature(reply_text, signature);
        let html = plain_to_html(&body);
        let transport = self.config.resolve_transport(account_id)?;

        self.deliver(email, &subject, &body, html, transport).await?;
        Ok(body)
    }

    /// Upsert the draft reply and transcript without sending
    ///
    /// `sent_at` stays absent for new records and untouched otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub async fn save_draft_reply(
        &self,
        email_id: &str,
        reply_text: &str,
        transcript: &Transcript,
        account_id: &str,
    ) -> AppResult<ReplyRecord> {
        self.store
            .upsert_draft(email_id, account_id, reply_text, transcript)
            .await
    }

    async fn deliver(
        &self,
        email: &EmailDetail,
        subject: &str,
        body_text: &str,
        body_html: String,
        transport: &SmtpConfig,
    ) -> AppResult<()> {
        let from_mailbox: Mailbox = match &transport.from_name {
            Some(name) => format!("{name} <{}>", transport.from_address),
            None => transport.from_address.clone(),
        }
        .parse()
        .map_err(|e| AppError::InvalidInput(format!("invalid transport from address: {e}")))?;
        let to_mailbox: Mailbox = email
            .from
            .parse()
            .map_err(|e| AppError::InvalidInput(format!("invalid recipient '{}': {e}", email.from)))?;

        let mut builder = Message::builder()
            .from(from_mailbox.clone())
            .reply_to(from_mailbox)
            .to(to_mailbox)
            .subject(subject);
        if !email.message_id.is_empty() {
            builder = builder
                .in_reply_to(email.message_id.clone())
                .references(email.message_id.clone());
        }

        let message = builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(SinglePart::plain(body_text.to_owned()))
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(body_html),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("failed to build outgoing message: {e}")))?;

        let relay = match transport.encryption {
            SmtpEncryption::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&transport.host),
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&transport.host)
            }
        }
        .map_err(|e| AppError::Internal(format!("smtp relay setup failed: {e}")))?;

        let mailer = relay
            .port(transport.port)
            .credentials(Credentials::new(
                transport.user.clone(),
                transport.pass.expose_secret().to_owned(),
            ))
            .timeout(Some(Duration::from_millis(self.config.socket_timeout_ms)))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("smtp send failed: {e}")))?;
        Ok(())
    }
}

/// Prefix the subject with `Re: ` unless one is already present
///
/// The check is case-insensitive, so `RE:` and `re:` subjects pass through
/// unchanged.
pub fn format_reply_subject(original_subject: &str) -> String {
    if original_subject.to_lowercase().starts_with("re:") {
        original_subject.to_owned()
    } else {
        format!("Re: {original_subject}")
    }
}

/// Append a signature after a blank line, at most once
///
/// The reply is returned unchanged (modulo trailing whitespace) when the
/// signature is empty or already contained in the text.
pub fn append_signature(reply: &str, signature: &str) -> String {
    let signature = signature.trim();
    let reply = reply.trim_end();
    if signature.is_empty() || reply.contains(signature) {
        return reply.to_owned();
    }
    format!("{reply}\n\n{signature}")
}

/// Render plain text as minimal HTML
///
/// Escapes HTML-significant characters and converts line breaks to `<br />`
/// tags; no other markup is produced.
pub fn plain_to_html(reply: &str) -> String {
    let mut escaped = String::with_capacity(reply.len());
    for ch in reply.trim_end().chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            '\r' => {}
            '\n' => escaped.push_str("<br />\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{append_signature, format_reply_subject, plain_to_html};

    #[test]
    fn adds_re_prefix_to_plain_subjects() {
        assert_eq!(format_reply_subject("Meeting notes"), "Re: Meeting notes");
        assert_eq!(format_reply_subject(""), "Re: ");
    }

    #[test]
    fn keeps_existing_re_prefix_case_insensitively() {
        assert_eq!(format_reply_subject("RE: Meeting notes"), "RE: Meeting notes");
        assert_eq!(format_reply_subject("re: hi"), "re: hi");
        assert_eq!(format_reply_subject("Re: Re: hi"), "Re: Re: hi");
    }

    #[test]
    fn appends_signature_after_blank_line() {
        let combined = append_signature("Thanks for reaching out.", "Kind regards\nLucas");
        assert_eq!(combined, "Thanks for reaching out.\n\nKind regards\nLucas");
    }

    #[test]
    fn does_not_duplicate_present_signature() {
        let reply = "Thanks.\n\nKind regards\nLucas";
        assert_eq!(append_signature(reply, "Kind regards\nLucas"), reply);
    }

    #[test]
    fn empty_signature_leaves_reply_untouched() {
        assert_eq!(append_signature("Thanks.  \n", "  "), "Thanks.");
    }

    #[test]
    fn plain_to_html_escapes_and_converts_line_breaks() {
        assert_eq!(
            plain_to_html("a < b & c\r\n\"quoted\"\n"),
            "a &lt; b &amp; c<br />\n&quot;quoted&quot;"
        );
    }

    #[test]
    fn plain_to_html_adds_no_other_markup() {
        assert_eq!(plain_to_html("hello world"), "hello world");
    }
}
