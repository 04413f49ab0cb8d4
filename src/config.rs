//! Configuration module for mail accounts, transports, and server settings
//!
//! All configuration is loaded from environment variables. IMAP accounts are
//! discovered by scanning for `MAIL_IMAP_<SEGMENT>_HOST` variables, outbound
//! SMTP transports by scanning for `MAIL_SMTP_<SEGMENT>_HOST`, and signatures
//! by scanning for `MAIL_SIGNATURE_<SEGMENT>`.

use std::collections::BTreeMap;
use std::env;
use std::env::VarError;

use regex::Regex;
use secrecy::SecretString;

use crate::errors::{AppError, AppResult};

/// Default OpenAI-compatible chat completions endpoint
const DEFAULT_AI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Listing order for inbox fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOrder {
    /// Newest messages first (default)
    Desc,
    /// Oldest messages first
    Asc,
}

/// IMAP account configuration
///
/// Holds connection details and credentials for a single mail account.
/// Passwords are stored using `SecretString` to prevent accidental logging.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    /// Account identifier (lowercase, used as default `account` parameter)
    pub account_id: String,
    /// IMAP server hostname
    pub host: String,
    /// IMAP server port (typically 993 for TLS)
    pub port: u16,
    /// Whether to use TLS (currently enforced to `true`)
    pub secure: bool,
    /// Username for authentication
    pub user: String,
    /// Password stored in a type that prevents accidental logging
    pub pass: SecretString,
    /// Maximum messages returned by an inbox listing
    pub fetch_limit: usize,
    /// Listing order (newest-first by default)
    pub fetch_order: FetchOrder,
    /// Explicit outbound transport key, if configured
    pub smtp_transport: Option<String>,
}

/// SMTP connection security for an outbound transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// Implicit TLS (SMTPS, port 465)
    Tls,
    /// STARTTLS upgrade (submission, port 587)
    StartTls,
}

/// Outbound SMTP transport configuration
///
/// One entry per logical transport key. Accounts resolve to a transport via
/// [`AppConfig::resolve_transport`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Transport identifier (lowercase)
    pub transport_id: String,
    /// SMTP relay hostname
    pub host: String,
    /// SMTP relay port
    pub port: u16,
    /// Username for authentication
    pub user: String,
    /// Password stored in a type that prevents accidental logging
    pub pass: SecretString,
    /// Connection security mode
    pub encryption: SmtpEncryption,
    /// Sender address placed in the From header
    pub from_address: String,
    /// Optional display name for the From header
    pub from_name: Option<String>,
}

/// Language model client configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Chat completions endpoint URL
    pub api_url: String,
    /// Bearer token for the provider
    pub api_key: SecretString,
    /// Fixed model selection
    pub model: String,
    /// Fixed sampling temperature
    pub temperature: f32,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

/// Application-wide configuration
///
/// Wraps all account, transport, and signature maps plus global settings.
/// Cloned into HTTP handlers via `Arc` for thread-safe shared access.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// All configured IMAP accounts, keyed by `account_id`
    pub accounts: BTreeMap<String, AccountConfig>,
    /// All configured SMTP transports, keyed by `transport_id`
    pub transports: BTreeMap<String, SmtpConfig>,
    /// Signature text per account id; `default` is the fallback entry
    pub signatures: BTreeMap<String, String>,
    /// Language model settings
    pub ai: AiConfig,
    /// HTTP bind address (host:port)
    pub bind_addr: String,
    /// SQLite database path
    pub database_path: String,
    /// TCP connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// IMAP greeting/TLS handshake timeout in milliseconds
    pub greeting_timeout_ms: u64,
    /// Socket I/O timeout in milliseconds
    pub socket_timeout_ms: u64,
    /// Recent-window size scanned by the fallback message lookup
    pub scan_window: usize,
}

impl AppConfig {
    /// Load all configuration from environment variables
    ///
    /// Discovers accounts by scanning for `MAIL_IMAP_*_HOST` patterns and
    /// transports by scanning for `MAIL_SMTP_*_HOST`. If no accounts are
    /// explicitly defined, a `default` account is required via
    /// `MAIL_IMAP_DEFAULT_HOST`, `MAIL_IMAP_DEFAULT_USER`, and
    /// `MAIL_IMAP_DEFAULT_PASS`. `MAIL_AI_KEY` is always required.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if required environment variables are missing
    /// or malformed.
    ///
    /// # Example Environment
    ///
    /// ```text
    /// MAIL_IMAP_DEFAULT_HOST=imap.example.com
    /// MAIL_IMAP_DEFAULT_USER=user@example.com
    /// MAIL_IMAP_DEFAULT_PASS=app-password
    /// MAIL_SMTP_DEFAULT_HOST=smtp.example.com
    /// MAIL_SMTP_DEFAULT_USER=user@example.com
    /// MAIL_SMTP_DEFAULT_PASS=app-password
    /// MAIL_SMTP_DEFAULT_FROM=user@example.com
    /// MAIL_SIGNATURE_DEFAULT="Kind regards"
    /// MAIL_AI_KEY=sk-...
    /// ```
    pub fn load_from_env() -> AppResult<Self> {
        let accounts = load_discovered(
            r"^MAIL_IMAP_([A-Z0-9_]+)_HOST$",
            true,
            load_account,
            |a| a.account_id.clone(),
        )?;
        let transports = load_discovered(
            r"^MAIL_SMTP_([A-Z0-9_]+)_HOST$",
            false,
            load_transport,
            |t| t.transport_id.clone(),
        )?;

        Ok(Self {
            accounts,
            transports,
            signatures: load_signatures()?,
            ai: load_ai()?,
            bind_addr: optional_env("MAIL_HTTP_BIND")?
                .unwrap_or_else(|| "127.0.0.1:8080".to_owned()),
            database_path: optional_env("MAIL_DB_PATH")?
                .unwrap_or_else(|| "email_replies.db".to_owned()),
            connect_timeout_ms: parse_u64_env("MAIL_IMAP_CONNECT_TIMEOUT_MS", 30_000)?,
            greeting_timeout_ms: parse_u64_env("MAIL_IMAP_GREETING_TIMEOUT_MS", 15_000)?,
            socket_timeout_ms: parse_u64_env("MAIL_IMAP_SOCKET_TIMEOUT_MS", 300_000)?,
            scan_window: parse_usize_env("MAIL_IMAP_SCAN_WINDOW", 100)?,
        })
    }

    /// Get account configuration by ID
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account ID is not configured.
    pub fn get_account(&self, account_id: &str) -> AppResult<&AccountConfig> {
        self.accounts
            .get(account_id)
            .ok_or_else(|| AppError::NotFound(format!("account '{account_id}' is not configured")))
    }

    /// Resolve the outbound SMTP transport for a logical account
    ///
    /// Resolution order: the account's explicit `TRANSPORT` key, a transport
    /// sharing the account's id, then the `default` transport.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when no transport matches and no default exists.
    pub fn resolve_transport(&self, account_id: &str) -> AppResult<&SmtpConfig> {
        if let Some(account) = self.accounts.get(account_id)
            && let Some(key) = &account.smtp_transport
        {
            return self.transports.get(key).ok_or_else(|| {
                AppError::NotFound(format!(
                    "transport '{key}' mapped from account '{account_id}' is not configured"
                ))
            });
        }
        self.transports
            .get(account_id)
            .or_else(|| self.transports.get("default"))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no outbound transport configured for account '{account_id}'"
                ))
            })
    }

    /// Signature text for an account, falling back to the `default` entry
    pub fn signature_for(&self, account_id: &str) -> Option<&str> {
        self.signatures
            .get(account_id)
            .or_else(|| self.signatures.get("default"))
            .map(String::as_str)
    }
}

/// Discover and load entries keyed by an env-name pattern
///
/// Scans the environment for names matching `pattern` (one capture group:
/// the segment), loads each segment via `load`, and keys the result map with
/// `key_of`. When `require_default` is set and nothing matched, a `DEFAULT`
/// segment is loaded anyway (and its required variables must exist).
fn load_discovered<T>(
    pattern: &str,
    require_default: bool,
    load: impl Fn(&str) -> AppResult<T>,
    key_of: impl Fn(&T) -> String,
) -> AppResult<BTreeMap<String, T>> {
    let re = Regex::new(pattern)
        .map_err(|e| AppError::Internal(format!("invalid discovery regex: {e}")))?;

    let mut segments: Vec<String> = env::vars()
        .filter_map(|(k, _)| re.captures(&k).and_then(|c| c.get(1).map(|m| m.as_str().to_owned())))
        .collect();

    if segments.is_empty() && require_default {
        segments.push("DEFAULT".to_owned());
    }

    segments.sort();
    segments.dedup();

    let mut entries = BTreeMap::new();
    for seg in segments {
        let entry = load(&seg)?;
        entries.insert(key_of(&entry), entry);
    }
    Ok(entries)
}

/// Load a single IMAP account configuration from environment
///
/// Reads `MAIL_IMAP_<SEGMENT>_HOST`, `_USER`, `_PASS`, `_PORT`, `_SECURE`,
/// `_LIMIT`, `_FETCH_ORDER`, and `_TRANSPORT`. Normalizes the segment name to
/// lowercase for `account_id` (except `DEFAULT` becomes `default`).
fn load_account(segment: &str) -> AppResult<AccountConfig> {
    let prefix = format!("MAIL_IMAP_{}_", sanitize_segment(segment));
    let host = required_env(&format!("{prefix}HOST"))?;
    let user = required_env(&format!("{prefix}USER"))?;
    let pass = required_env(&format!("{prefix}PASS"))?;

    Ok(AccountConfig {
        account_id: segment_id(segment),
        host,
        port: parse_u16_env(&format!("{prefix}PORT"), 993)?,
        secure: parse_bool_env(&format!("{prefix}SECURE"), true)?,
        user,
        pass: SecretString::new(pass.into()),
        fetch_limit: parse_usize_env(&format!("{prefix}LIMIT"), 100)?,
        fetch_order: parse_fetch_order_env(&format!("{prefix}FETCH_ORDER"))?,
        smtp_transport: optional_env(&format!("{prefix}TRANSPORT"))?,
    })
}

/// Load a single SMTP transport configuration from environment
///
/// Reads `MAIL_SMTP_<SEGMENT>_HOST`, `_USER`, `_PASS`, `_FROM`, `_FROM_NAME`,
/// `_PORT`, and `_ENCRYPTION`. The default port follows the encryption mode
/// (465 for implicit TLS, 587 for STARTTLS).
fn load_transport(segment: &str) -> AppResult<SmtpConfig> {
    let prefix = format!("MAIL_SMTP_{}_", sanitize_segment(segment));
    let host = required_env(&format!("{prefix}HOST"))?;
    let user = required_env(&format!("{prefix}USER"))?;
    let pass = required_env(&format!("{prefix}PASS"))?;
    let from_address = required_env(&format!("{prefix}FROM"))?;
    let encryption = parse_encryption_env(&format!("{prefix}ENCRYPTION"))?;
    let default_port = match encryption {
        SmtpEncryption::Tls => 465,
        SmtpEncryption::StartTls => 587,
    };

    Ok(SmtpConfig {
        transport_id: segment_id(segment),
        host,
        port: parse_u16_env(&format!("{prefix}PORT"), default_port)?,
        user,
        pass: SecretString::new(pass.into()),
        encryption,
        from_address,
        from_name: optional_env(&format!("{prefix}FROM_NAME"))?,
    })
}

/// Load the per-account signature map from `MAIL_SIGNATURE_*` variables
fn load_signatures() -> AppResult<BTreeMap<String, String>> {
    let re = Regex::new(r"^MAIL_SIGNATURE_([A-Z0-9_]+)$")
        .map_err(|e| AppError::Internal(format!("invalid signature regex: {e}")))?;

    let mut signatures = BTreeMap::new();
    for (key, value) in env::vars() {
        if let Some(seg) = re.captures(&key).and_then(|c| c.get(1).map(|m| m.as_str().to_owned()))
            && !value.trim().is_empty()
        {
            signatures.insert(segment_id(&seg), value);
        }
    }
    Ok(signatures)
}

/// Load language model settings
///
/// `MAIL_AI_KEY` is required; the remaining settings default to the OpenAI
/// chat completions endpoint, `gpt-4`, temperature 0.7, and a 60s timeout.
fn load_ai() -> AppResult<AiConfig> {
    let api_key = required_env("MAIL_AI_KEY")?;
    Ok(AiConfig {
        api_url: optional_env("MAIL_AI_URL")?.unwrap_or_else(|| DEFAULT_AI_URL.to_owned()),
        api_key: SecretString::new(api_key.into()),
        model: optional_env("MAIL_AI_MODEL")?.unwrap_or_else(|| "gpt-4".to_owned()),
        temperature: parse_f32_env("MAIL_AI_TEMPERATURE", 0.7)?,
        timeout_ms: parse_u64_env("MAIL_AI_TIMEOUT_MS", 60_000)?,
    })
}

/// Normalize a segment name to its lowercase id (`DEFAULT` → `default`)
fn segment_id(segment: &str) -> String {
    if segment == "DEFAULT" {
        "default".to_owned()
    } else {
        segment.to_ascii_lowercase()
    }
}

/// Read a required environment variable, returning error if missing or empty
fn required_env(key: &str) -> AppResult<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::InvalidInput(format!(
            "missing required environment variable {key}"
        ))),
    }
}

/// Read an optional environment variable, treating empty values as unset
fn optional_env(key: &str) -> AppResult<Option<String>> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(Some(v)),
        Ok(_) | Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Sanitize an account segment to uppercase alphanumeric/underscore
///
/// Non-alphanumeric characters are replaced with underscores, and leading/
/// trailing underscores are trimmed.
fn sanitize_segment(seg: &str) -> String {
    let mut out = String::with_capacity(seg.len());
    for ch in seg.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push('_');
        }
    }
    out.trim_matches('_').to_owned()
}

/// Parse a boolean environment variable with flexible values
///
/// Accepts: `1`, `true`, `yes`, `y`, `on` (truthy) or `0`, `false`, `no`,
/// `n`, `off` (falsy). Case-insensitive. Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set to an unrecognized value.
fn parse_bool_env(key: &str, default: bool) -> AppResult<bool> {
    match env::var(key) {
        Ok(v) => parse_bool_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!("invalid boolean environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

fn parse_bool_value(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a listing-order environment variable (`desc`/`asc`, default `desc`)
fn parse_fetch_order_env(key: &str) -> AppResult<FetchOrder> {
    match env::var(key) {
        Ok(v) => parse_fetch_order_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "invalid fetch order environment variable {key}: '{v}' (expected 'desc' or 'asc')"
            ))
        }),
        Err(VarError::NotPresent) => Ok(FetchOrder::Desc),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

fn parse_fetch_order_value(value: &str) -> Option<FetchOrder> {
    match value.trim().to_ascii_lowercase().as_str() {
        "desc" => Some(FetchOrder::Desc),
        "asc" => Some(FetchOrder::Asc),
        _ => None,
    }
}

/// Parse an SMTP encryption environment variable (`tls`/`starttls`, default `tls`)
fn parse_encryption_env(key: &str) -> AppResult<SmtpEncryption> {
    match env::var(key) {
        Ok(v) => parse_encryption_value(&v).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "invalid encryption environment variable {key}: '{v}' (expected 'tls' or 'starttls')"
            ))
        }),
        Err(VarError::NotPresent) => Ok(SmtpEncryption::Tls),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

fn parse_encryption_value(value: &str) -> Option<SmtpEncryption> {
    match value.trim().to_ascii_lowercase().as_str() {
        "tls" | "ssl" => Some(SmtpEncryption::Tls),
        "starttls" => Some(SmtpEncryption::StartTls),
        _ => None,
    }
}

/// Parse a `u16` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u16`.
fn parse_u16_env(key: &str, default: u16) -> AppResult<u16> {
    match env::var(key) {
        Ok(v) => v.parse::<u16>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u16 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `u64` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `u64`.
fn parse_u64_env(key: &str, default: u64) -> AppResult<u64> {
    match env::var(key) {
        Ok(v) => v.parse::<u64>().map_err(|_| {
            AppError::InvalidInput(format!("invalid u64 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse a `usize` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `usize`.
fn parse_usize_env(key: &str, default: usize) -> AppResult<usize> {
    match env::var(key) {
        Ok(v) => v.parse::<usize>().map_err(|_| {
            AppError::InvalidInput(format!("invalid usize environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

/// Parse an `f32` environment variable with default fallback
///
/// Returns `default` if unset.
///
/// # Errors
///
/// Returns `InvalidInput` if the variable is set but not a valid `f32`.
fn parse_f32_env(key: &str, default: f32) -> AppResult<f32> {
    match env::var(key) {
        Ok(v) => v.parse::<f32>().map_err(|_| {
            AppError::InvalidInput(format!("invalid f32 environment variable {key}: '{v}'"))
        }),
        Err(VarError::NotPresent) => Ok(default),
        Err(VarError::NotUnicode(_)) => Err(AppError::InvalidInput(format!(
            "environment variable {key} contains non-unicode data"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use secrecy::SecretString;

    use super::{
        AiConfig, AppConfig, FetchOrder, SmtpConfig, SmtpEncryption, parse_bool_value,
        parse_encryption_value, parse_fetch_order_value, sanitize_segment, segment_id,
    };

    fn transport(id: &str) -> SmtpConfig {
        SmtpConfig {
            transport_id: id.to_owned(),
            host: "smtp.example.com".to_owned(),
            port: 465,
            user: "user@example.com".to_owned(),
            pass: SecretString::new("secret".to_owned().into()),
            encryption: SmtpEncryption::Tls,
            from_address: "user@example.com".to_owned(),
            from_name: None,
        }
    }

    fn config_with_transports(ids: &[&str]) -> AppConfig {
        let mut transports = BTreeMap::new();
        for id in ids {
            transports.insert((*id).to_owned(), transport(id));
        }
        AppConfig {
            accounts: BTreeMap::new(),
            transports,
            signatures: BTreeMap::new(),
            ai: AiConfig {
                api_url: "https://api.example.com".to_owned(),
                api_key: SecretString::new("key".to_owned().into()),
                model: "gpt-4".to_owned(),
                temperature: 0.7,
                timeout_ms: 60_000,
            },
            bind_addr: "127.0.0.1:8080".to_owned(),
            database_path: ":memory:".to_owned(),
            connect_timeout_ms: 30_000,
            greeting_timeout_ms: 15_000,
            socket_timeout_ms: 300_000,
            scan_window: 100,
        }
    }

    #[test]
    fn parse_bool_value_accepts_common_truthy_and_falsy_values() {
        for truthy in ["1", "true", "TRUE", " yes ", "Y", "on"] {
            assert_eq!(parse_bool_value(truthy), Some(true));
        }

        for falsy in ["0", "false", "FALSE", " no ", "N", "off"] {
            assert_eq!(parse_bool_value(falsy), Some(false));
        }
    }

    #[test]
    fn parse_bool_value_rejects_unrecognized_values() {
        for invalid in ["", "2", "maybe", "enabled", "disabled"] {
            assert_eq!(parse_bool_value(invalid), None);
        }
    }

    #[test]
    fn parse_fetch_order_value_accepts_desc_and_asc_only() {
        assert_eq!(parse_fetch_order_value("desc"), Some(FetchOrder::Desc));
        assert_eq!(parse_fetch_order_value(" ASC "), Some(FetchOrder::Asc));
        assert_eq!(parse_fetch_order_value("newest"), None);
    }

    #[test]
    fn parse_encryption_value_accepts_tls_aliases() {
        assert_eq!(parse_encryption_value("tls"), Some(SmtpEncryption::Tls));
        assert_eq!(parse_encryption_value("SSL"), Some(SmtpEncryption::Tls));
        assert_eq!(
            parse_encryption_value("starttls"),
            Some(SmtpEncryption::StartTls)
        );
        assert_eq!(parse_encryption_value("plain"), None);
    }

    #[test]
    fn segment_ids_normalize_to_lowercase_with_default_special_case() {
        assert_eq!(segment_id("DEFAULT"), "default");
        assert_eq!(segment_id("INFO"), "info");
        assert_eq!(sanitize_segment("my-seg"), "MY_SEG");
    }

    #[test]
    fn resolve_transport_falls_back_to_default() {
        let config = config_with_transports(&["default", "smtp1"]);
        let resolved = config
            .resolve_transport("unknown-account")
            .expect("default transport must resolve");
        assert_eq!(resolved.transport_id, "default");

        let named = config
            .resolve_transport("smtp1")
            .expect("same-named transport must resolve");
        assert_eq!(named.transport_id, "smtp1");
    }

    #[test]
    fn resolve_transport_errors_without_default() {
        let config = config_with_transports(&["smtp1"]);
        let err = config
            .resolve_transport("unknown-account")
            .expect_err("must fail without a default transport");
        assert!(err.to_string().contains("no outbound transport"));
    }

    #[test]
    fn signature_lookup_falls_back_to_default_entry() {
        let mut config = config_with_transports(&["default"]);
        config
            .signatures
            .insert("default".to_owned(), "Kind regards".to_owned());
        config
            .signatures
            .insert("info".to_owned(), "The info team".to_owned());

        assert_eq!(config.signature_for("info"), Some("The info team"));
        assert_eq!(config.signature_for("damian"), Some("Kind regards"));
    }
}
