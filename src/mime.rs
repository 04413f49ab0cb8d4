//! Message parsing and MIME handling
//!
//! Parses RFC822 messages using `mailparse`, extracts body text/HTML, and
//! normalizes headers to plain strings. HTML bodies are sanitized with
//! `ammonia`; when a message has no text part, a plain-text body is derived
//! from the HTML with `html2text`.

use mailparse::{MailAddr, MailHeader, ParsedMail};

use crate::errors::{AppError, AppResult};

/// Render width used when deriving a text body from HTML
const TEXT_RENDER_WIDTH: usize = 80;

/// Parsed message representation
///
/// All fields are plain strings or absent; no `mailparse` types escape this
/// module.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    /// Normalized Date header (ISO-8601 when parseable, raw text otherwise)
    pub date: Option<String>,
    /// Bare sender address from the From header
    pub from: Option<String>,
    /// Bare recipient address from the To header
    pub to: Option<String>,
    /// Subject header
    pub subject: Option<String>,
    /// Message-ID header
    pub message_id: Option<String>,
    /// Plain text body (derived from HTML when no text part exists)
    pub body_text: Option<String>,
    /// Sanitized HTML body
    pub body_html_sanitized: Option<String>,
}

/// Parse RFC822 message into structured representation
///
/// Extracts headers and body text/HTML. The HTML body is sanitized; a text
/// body is derived from it when the message has no text/plain part.
///
/// # Errors
///
/// - `Internal` if `mailparse` fails
pub fn parse_message(raw: &[u8]) -> AppResult<ParsedMessage> {
    let parsed = mailparse::parse_mail(raw)
        .map_err(|e| AppError::Internal(format!("failed to parse RFC822 message: {e}")))?;

    let headers = parse_header_bytes(raw)?;
    let mut body_text = None;
    let mut body_html = None;
    walk_parts(&parsed, &mut body_text, &mut body_html);

    if body_text.is_none()
        && let Some(html) = &body_html
    {
        body_text = html2text::from_read(html.as_bytes(), TEXT_RENDER_WIDTH).ok();
    }

    Ok(ParsedMessage {
        date: header_value(&headers, "date").map(|d| normalize_date(&d)),
        from: header_value(&headers, "from").and_then(|v| first_address(&v)),
        to: header_value(&headers, "to").and_then(|v| first_address(&v)),
        subject: header_value(&headers, "subject"),
        message_id: header_value(&headers, "message-id"),
        body_text,
        body_html_sanitized: body_html,
    })
}

/// Walk MIME part tree recursively
///
/// Traverses all MIME parts to extract the first text/plain and text/html
/// bodies. Attachment parts are skipped.
fn walk_parts(part: &ParsedMail<'_>, body_text: &mut Option<String>, body_html: &mut Option<String>) {
    if part.subparts.is_empty() {
        let ctype = part.ctype.mimetype.to_ascii_lowercase();
        let disp = part.get_content_disposition();
        let is_attachment = disp.disposition == mailparse::DispositionType::Attachment;

        if !is_attachment {
            if ctype == "text/plain"
                && body_text.is_none()
                && let Ok(text) = part.get_body()
            {
                *body_text = Some(text);
            }

            if ctype == "text/html"
                && body_html.is_none()
                && let Ok(html) = part.get_body()
            {
                *body_html = Some(ammonia::clean(&html));
            }
        }

        return;
    }

    for sub in &part.subparts {
        walk_parts(sub, body_text, body_html);
    }
}

/// Parse header bytes into key-value pairs
pub fn parse_header_bytes(header_bytes: &[u8]) -> AppResult<Vec<(String, String)>> {
    let (headers, _) = mailparse::parse_headers(header_bytes)
        .map_err(|e| AppError::Internal(format!("failed to parse message headers: {e}")))?;
    Ok(to_tuples(headers))
}

/// Convert mailparse headers to tuples
fn to_tuples(headers: Vec<MailHeader<'_>>) -> Vec<(String, String)> {
    headers
        .into_iter()
        .map(|h| (h.get_key(), h.get_value()))
        .collect()
}

/// Get header value by case-insensitive key
pub fn header_value(headers: &[(String, String)], key: &str) -> Option<String> {
    headers
        .iter()
        .find_map(|(k, v)| k.eq_ignore_ascii_case(key).then(|| v.clone()))
}

/// Extract the first bare address from an address header value
///
/// Display names and group wrappers are stripped; `"Lucas <a@b.ch>"` yields
/// `"a@b.ch"`. Returns `None` when the value does not parse as an address.
pub fn first_address(value: &str) -> Option<String> {
    let parsed = mailparse::addrparse(value).ok()?;
    parsed.iter().find_map(|addr| match addr {
        MailAddr::Single(info) => Some(info.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|a| a.addr.clone()),
    })
}

/// Normalize an RFC 2822 date header to ISO-8601
///
/// Falls back to the raw header text when the date does not parse, so the
/// caller always has something to display.
pub fn normalize_date(value: &str) -> String {
    chrono::DateTime::parse_from_rfc2822(value.trim())
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|_| value.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::{first_address, header_value, normalize_date, parse_message};

    #[test]
    fn parses_simple_plain_text_message() {
        let raw = b"From: Lucas Baldauf <sender@example.com>\r\nTo: user@example.com\r\nSubject: Hi\r\nMessage-ID: <abc@example.com>\r\nDate: Wed, 1 Jan 2025 00:00:00 +0000\r\n\r\nHello there";
        let parsed = parse_message(raw).expect("parse should succeed");

        assert_eq!(parsed.subject.as_deref(), Some("Hi"));
        assert_eq!(parsed.from.as_deref(), Some("sender@example.com"));
        assert_eq!(parsed.to.as_deref(), Some("user@example.com"));
        assert_eq!(parsed.message_id.as_deref(), Some("<abc@example.com>"));
        assert_eq!(parsed.date.as_deref(), Some("2025-01-01T00:00:00+00:00"));
        assert_eq!(parsed.body_text.as_deref(), Some("Hello there"));
        assert!(parsed.body_html_sanitized.is_none());
    }

    #[test]
    fn derives_text_body_from_html_only_message() {
        let raw = b"From: sender@example.com\r\nSubject: Html only\r\nContent-Type: text/html; charset=utf-8\r\n\r\n<p>Hello <b>there</b></p>";
        let parsed = parse_message(raw).expect("parse should succeed");

        let text = parsed.body_text.expect("text body must be derived");
        assert!(text.contains("Hello"));
        assert!(parsed.body_html_sanitized.is_some());
    }

    #[test]
    fn sanitizes_script_out_of_html_body() {
        let raw = b"From: sender@example.com\r\nSubject: Bad\r\nContent-Type: text/html\r\n\r\n<p>ok</p><script>alert(1)</script>";
        let parsed = parse_message(raw).expect("parse should succeed");

        let html = parsed.body_html_sanitized.expect("html body expected");
        assert!(!html.contains("script"));
        assert!(html.contains("ok"));
    }

    #[test]
    fn first_address_strips_display_names_and_groups() {
        assert_eq!(
            first_address("Lucas Baldauf <lucas@myitjob.ch>").as_deref(),
            Some("lucas@myitjob.ch")
        );
        assert_eq!(
            first_address("team: a@example.com, b@example.com;").as_deref(),
            Some("a@example.com")
        );
        assert_eq!(first_address(""), None);
    }

    #[test]
    fn normalize_date_passes_through_unparseable_values() {
        assert_eq!(
            normalize_date("Wed, 1 Jan 2025 09:30:00 +0100"),
            "2025-01-01T09:30:00+01:00"
        );
        assert_eq!(normalize_date(" sometime "), "sometime");
    }

    #[test]
    fn header_value_is_case_insensitive() {
        let headers = vec![("Subject".to_owned(), "Meeting notes".to_owned())];
        assert_eq!(
            header_value(&headers, "subject").as_deref(),
            Some("Meeting notes")
        );
        assert_eq!(header_value(&headers, "from"), None);
    }
}
