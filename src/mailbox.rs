//! Mailbox reader: inbox listing and single-message lookup
//!
//! Translates one configured account's connection parameters into the two
//! read operations the HTTP layer needs. Provider and network failures never
//! cross this boundary; they are logged and degrade to an empty listing or an
//! absent message.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, FetchOrder};
use crate::errors::{AppError, AppResult};
use crate::imap::{self, ImapSession};
use crate::mime;
use crate::models::{EmailDetail, EmailSummary, NO_SUBJECT, UNKNOWN_ADDRESS};

/// Header-only fetch query for inbox listings (`BODY.PEEK` leaves messages unread)
const LIST_QUERY: &str = "UID BODY.PEEK[HEADER.FIELDS (DATE FROM SUBJECT MESSAGE-ID)]";
/// UID-only fetch query for the lookup scan window
const SCAN_QUERY: &str = "UID";

/// Ordered single-message lookup strategies
///
/// Tried in declaration order; the first hit wins. A failing strategy is
/// logged and the next one is attempted.
#[derive(Debug, Clone, Copy)]
enum LookupStrategy {
    /// Direct `UID FETCH` (numeric identifiers only)
    DirectUid,
    /// Scan a bounded recent window and match the UID by string equality
    ScanWindow,
    /// Treat a numeric identifier as a 1-based position in the recent window
    NumericPosition,
}

const LOOKUP_STRATEGIES: [LookupStrategy; 3] = [
    LookupStrategy::DirectUid,
    LookupStrategy::ScanWindow,
    LookupStrategy::NumericPosition,
];

/// Inbox read operations for configured accounts
#[derive(Clone)]
pub struct MailboxReader {
    config: Arc<AppConfig>,
}

impl MailboxReader {
    /// Create a reader over the shared configuration
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self { config }
    }

    /// List recent inbox messages for an account
    ///
    /// Fetches headers only, up to the account's configured limit, in its
    /// configured order. Any failure is logged and yields an empty list; an
    /// empty inbox and an unreachable server look the same to callers.
    pub async fn list_inbox(&self, account_id: &str) -> Vec<EmailSummary> {
        match self.list_inbox_impl(account_id).await {
            Ok(emails) => emails,
            Err(e) => {
                error!(account = account_id, error = %e, "inbox listing failed");
                Vec::new()
            }
        }
    }

    async fn list_inbox_impl(&self, account_id: &str) -> AppResult<Vec<EmailSummary>> {
        let account = self.config.get_account(account_id)?;
        let mut session = imap::connect_authenticated(&self.config, account).await?;
        let mailbox = imap::examine_inbox(&self.config, &mut session).await?;

        if mailbox.exists == 0 {
            info!(account = account_id, "inbox is empty");
            return Ok(Vec::new());
        }

        let limit = account.fetch_limit.max(1);
        let range = recent_range(mailbox.exists, limit);
        debug!(account = account_id, range = %range, "fetching inbox window");
        let mut fetches =
            imap::fetch_sequence(&self.config, &mut session, &range, LIST_QUERY).await?;

        if fetches.is_empty() {
            // Some servers return nothing for a windowed range; try the whole
            // mailbox once before giving up.
            warn!(
                account = account_id,
                "windowed fetch returned no results, trying broader fetch"
            );
            fetches = imap::fetch_sequence(&self.config, &mut session, "1:*", LIST_QUERY).await?;
        }

        fetches.sort_by(|a, b| b.message.cmp(&a.message));
        fetches.truncate(limit);

        let mut emails: Vec<EmailSummary> = fetches
            .iter()
            .map(|fetch| {
                let id = fetch
                    .uid
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| fetch.message.to_string());
                summary_from_header_bytes(id, fetch.header().or_else(|| fetch.body()))
            })
            .collect();

        if account.fetch_order == FetchOrder::Asc {
            emails.reverse();
        }

        info!(
            account = account_id,
            count = emails.len(),
            "retrieved inbox listing"
        );
        Ok(emails)
    }

    /// Fetch one message by its opaque identifier
    ///
    /// Tries each [`LookupStrategy`] in turn and returns `None` when all of
    /// them miss or when the account/connection fails (logged, not raised).
    pub async fn get_message(&self, account_id: &str, id: &str) -> Option<EmailDetail> {
        match self.get_message_impl(account_id, id).await {
            Ok(found) => found,
            Err(e) => {
                error!(account = account_id, email_id = id, error = %e, "message lookup failed");
                None
            }
        }
    }

    async fn get_message_impl(&self, account_id: &str, id: &str) -> AppResult<Option<EmailDetail>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        let account = self.config.get_account(account_id)?;
        let mut session = imap::connect_authenticated(&self.config, account).await?;
        let mailbox = imap::examine_inbox(&self.config, &mut session).await?;
        if mailbox.exists == 0 {
            return Ok(None);
        }

        for strategy in LOOKUP_STRATEGIES {
            match self
                .try_strategy(strategy, &mut session, mailbox.exists, id)
                .await
            {
                Ok(Some(raw)) => {
                    debug!(account = account_id, email_id = id, ?strategy, "message found");
                    return detail_from_raw(id, &raw).map(Some);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        account = account_id,
                        email_id = id,
                        ?strategy,
                        error = %e,
                        "lookup strategy failed"
                    );
                }
            }
        }

        warn!(account = account_id, email_id = id, "no message found");
        Ok(None)
    }

    async fn try_strategy(
        &self,
        strategy: LookupStrategy,
        session: &mut ImapSession,
        exists: u32,
        id: &str,
    ) -> AppResult<Option<Vec<u8>>> {
        match strategy {
            LookupStrategy::DirectUid => {
                if !is_numeric(id) {
                    return Ok(None);
                }
                match imap::uid_fetch_one(&self.config, session, id, "UID RFC822").await {
                    Ok(fetch) => Ok(fetch.body().map(<[u8]>::to_vec)),
                    Err(AppError::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                }
            }
            LookupStrategy::ScanWindow => {
                let window = self.recent_window(session, exists).await?;
                match match_uid(&window, id) {
                    Some(sequence) => {
                        imap::fetch_raw_by_sequence(&self.config, session, sequence)
                            .await
                            .map(Some)
                    }
                    None => Ok(None),
                }
            }
            LookupStrategy::NumericPosition => {
                let window = self.recent_window(session, exists).await?;
                match match_position(window.len(), id) {
                    Some(index) => {
                        let sequence = window[index].0;
                        imap::fetch_raw_by_sequence(&self.config, session, sequence)
                            .await
                            .map(Some)
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Fetch the UID map of the most recent messages, newest first
    async fn recent_window(
        &self,
        session: &mut ImapSession,
        exists: u32,
    ) -> AppResult<Vec<(u32, String)>> {
        let range = recent_range(exists, self.config.scan_window.max(1));
        let fetches = imap::fetch_sequence(&self.config, session, &range, SCAN_QUERY).await?;
        let mut window: Vec<(u32, String)> = fetches
            .iter()
            .filter_map(|fetch| fetch.uid.map(|uid| (fetch.message, uid.to_string())))
            .collect();
        window.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(window)
    }
}

/// Sequence range covering the `limit` most recent messages
fn recent_range(exists: u32, limit: usize) -> String {
    let span = u32::try_from(limit.saturating_sub(1)).unwrap_or(u32::MAX);
    let start = exists.saturating_sub(span).max(1);
    format!("{start}:{exists}")
}

/// Whether an identifier is purely numeric
fn is_numeric(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Find the window sequence number whose UID string-equals the identifier
fn match_uid(window: &[(u32, String)], id: &str) -> Option<u32> {
    window
        .iter()
        .find_map(|(sequence, uid)| (uid == id).then_some(*sequence))
}

/// Interpret a numeric identifier as a 1-based window position
///
/// Position 1 is the most recent message. Returns the window index, or
/// `None` when the identifier is non-numeric or out of range.
fn match_position(window_len: usize, id: &str) -> Option<usize> {
    if !is_numeric(id) {
        return None;
    }
    let position: usize = id.parse().ok()?;
    (1..=window_len).contains(&position).then(|| position - 1)
}

/// Build a listing summary from fetched header bytes
///
/// Messages whose headers cannot be parsed still produce a minimal record so
/// one broken message does not hide the rest of the inbox.
fn summary_from_header_bytes(id: String, header_bytes: Option<&[u8]>) -> EmailSummary {
    let headers = header_bytes.and_then(|bytes| mime::parse_header_bytes(bytes).ok());
    let Some(headers) = headers else {
        error!(email_id = %id, "unable to parse message headers for listing");
        return EmailSummary {
            id,
            subject: "Error: Unable to process email".to_owned(),
            from: UNKNOWN_ADDRESS.to_owned(),
            date: None,
            message_id: String::new(),
        };
    };

    EmailSummary {
        id,
        subject: non_empty(mime::header_value(&headers, "subject"))
            .unwrap_or_else(|| NO_SUBJECT.to_owned()),
        from: mime::header_value(&headers, "from")
            .and_then(|v| mime::first_address(&v))
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
        date: mime::header_value(&headers, "date").map(|d| mime::normalize_date(&d)),
        message_id: mime::header_value(&headers, "message-id").unwrap_or_default(),
    }
}

/// Build a full detail record from raw RFC822 bytes
fn detail_from_raw(id: &str, raw: &[u8]) -> AppResult<EmailDetail> {
    let parsed = mime::parse_message(raw)?;
    Ok(EmailDetail {
        id: id.to_owned(),
        subject: non_empty(parsed.subject).unwrap_or_else(|| NO_SUBJECT.to_owned()),
        from: parsed
            .from
            .unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
        to: parsed.to.unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
        date: parsed.date,
        body: parsed.body_text.unwrap_or_default(),
        html: parsed.body_html_sanitized,
        message_id: parsed.message_id.unwrap_or_default(),
    })
}

/// Drop empty or whitespace-only values
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{
        detail_from_raw, is_numeric, match_position, match_uid, recent_range,
        summary_from_header_bytes,
    };

    fn window() -> Vec<(u32, String)> {
        vec![
            (42, "9001".to_owned()),
            (41, "8997".to_owned()),
            (40, "8902".to_owned()),
        ]
    }

    #[test]
    fn recent_range_covers_newest_messages() {
        assert_eq!(recent_range(120, 100), "21:120");
        assert_eq!(recent_range(5, 100), "1:5");
        assert_eq!(recent_range(1, 1), "1:1");
    }

    #[test]
    fn match_uid_requires_exact_string_equality() {
        assert_eq!(match_uid(&window(), "8997"), Some(41));
        assert_eq!(match_uid(&window(), "899"), None);
        assert_eq!(match_uid(&window(), "89970"), None);
    }

    #[test]
    fn match_position_is_one_based_and_bounded() {
        assert_eq!(match_position(3, "1"), Some(0));
        assert_eq!(match_position(3, "3"), Some(2));
        assert_eq!(match_position(3, "0"), None);
        assert_eq!(match_position(3, "4"), None);
        assert_eq!(match_position(3, "abc"), None);
    }

    #[test]
    fn is_numeric_rejects_mixed_identifiers() {
        assert!(is_numeric("12345"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("12a"));
        assert!(!is_numeric("<msg@example.com>"));
    }

    #[test]
    fn summary_defaults_missing_fields() {
        let raw = b"Date: Wed, 1 Jan 2025 00:00:00 +0000\r\n\r\n";
        let summary = summary_from_header_bytes("7".to_owned(), Some(raw));
        assert_eq!(summary.id, "7");
        assert_eq!(summary.subject, "No Subject");
        assert_eq!(summary.from, "Unknown");
        assert_eq!(summary.message_id, "");
        assert_eq!(summary.date.as_deref(), Some("2025-01-01T00:00:00+00:00"));
    }

    #[test]
    fn summary_extracts_bare_sender_address() {
        let raw = b"From: Lucas Baldauf <lucas@myitjob.ch>\r\nSubject: Offerte\r\nMessage-ID: <m1@myitjob.ch>\r\n\r\n";
        let summary = summary_from_header_bytes("9001".to_owned(), Some(raw));
        assert_eq!(summary.subject, "Offerte");
        assert_eq!(summary.from, "lucas@myitjob.ch");
        assert_eq!(summary.message_id, "<m1@myitjob.ch>");
    }

    #[test]
    fn detail_normalizes_every_field_to_plain_strings() {
        let raw = b"From: a@example.com\r\nTo: b@example.com\r\nSubject: Hello\r\nMessage-ID: <d1@example.com>\r\nDate: Wed, 1 Jan 2025 00:00:00 +0000\r\n\r\nBody text";
        let detail = detail_from_raw("55", raw).expect("detail should parse");
        assert_eq!(detail.id, "55");
        assert_eq!(detail.from, "a@example.com");
        assert_eq!(detail.to, "b@example.com");
        assert_eq!(detail.body, "Body text");
        assert!(detail.html.is_none());
    }
}
