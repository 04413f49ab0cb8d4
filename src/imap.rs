//! IMAP transport and session operations
//!
//! Provides timeout-bounded wrappers around `async-imap` operations. All network
//! calls are enforced to use TLS, and timeouts are derived from server config.

use std::sync::Arc;
use std::time::Duration;

use async_imap::types::{Fetch, Mailbox};
use async_imap::{Client, Session};
use futures::TryStreamExt;
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pki_types::ServerName;
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;

use crate::config::{AccountConfig, AppConfig};
use crate::errors::{AppError, AppResult};

/// Type alias for authenticated IMAP session over TLS
///
/// Wraps the TLS stream type to simplify signatures throughout the codebase.
pub type ImapSession = Session<tokio_rustls::client::TlsStream<TcpStream>>;

/// Get socket timeout duration from server config
///
/// Helper to avoid repeatedly accessing the config field.
fn socket_timeout(config: &AppConfig) -> Duration {
    Duration::from_millis(config.socket_timeout_ms)
}

/// Connect to IMAP server and authenticate
///
/// Performs full connection sequence with timeouts:
/// 1. TCP connect
/// 2. TLS handshake with system root certificates
/// 3. Read IMAP greeting
/// 4. LOGIN authentication
///
/// # Security
///
/// Rejects insecure connections (`secure: false`) to prevent password exposure.
///
/// # Timeouts
///
/// - TCP connect: `connect_timeout_ms`
/// - TLS handshake: `greeting_timeout_ms`
/// - Greeting read: `greeting_timeout_ms`
/// - LOGIN: `greeting_timeout_ms`
///
/// # Errors
///
/// - `InvalidInput` if `secure` is false or hostname is invalid for TLS SNI
/// - `Timeout` if any connection phase times out
/// - `AuthFailed` if authentication fails
/// - `Internal` for TCP, TLS, or greeting failures
pub async fn connect_authenticated(
    config: &AppConfig,
    account: &AccountConfig,
) -> AppResult<ImapSession> {
    if !account.secure {
        return Err(AppError::InvalidInput(
            "insecure IMAP is not supported; set MAIL_IMAP_<ACCOUNT>_SECURE=true".to_owned(),
        ));
    }

    let connect_duration = Duration::from_millis(config.connect_timeout_ms);
    let greeting_duration = Duration::from_millis(config.greeting_timeout_ms);

    let tcp = timeout(
        connect_duration,
        TcpStream::connect((account.host.as_str(), account.port)),
    )
    .await
    .map_err(|_| AppError::Timeout("tcp connect timeout".to_owned()))
    .and_then(|r| r.map_err(|e| AppError::Internal(format!("tcp connect failed: {e}"))))?;

    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(tls_config));

    let server_name = ServerName::try_from(account.host.clone())
        .map_err(|_| AppError::InvalidInput("invalid IMAP host for TLS SNI".to_owned()))?;
    let tls_stream = timeout(greeting_duration, connector.connect(server_name, tcp))
        .await
        .map_err(|_| AppError::Timeout("TLS handshake timeout".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("TLS handshake failed: {e}"))))?;

    let mut client = Client::new(tls_stream);
    let greeting = timeout(greeting_duration, client.read_response())
        .await
        .map_err(|_| AppError::Timeout("IMAP greeting timeout".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("IMAP greeting failed: {e}"))))?;

    if greeting.is_none() {
        return Err(AppError::Internal(
            "IMAP server closed connection before greeting".to_owned(),
        ));
    }

    let pass = account.pass.expose_secret();
    let session = timeout(greeting_duration, client.login(account.user.as_str(), pass))
        .await
        .map_err(|_| AppError::Timeout("IMAP login timeout".to_owned()))
        .and_then(|r| {
            r.map_err(|(e, _)| {
                let msg = e.to_string();
                if msg.to_ascii_lowercase().contains("auth") || msg.contains("LOGIN") {
                    AppError::AuthFailed(msg)
                } else {
                    AppError::Internal(msg)
                }
            })
        })?;

    Ok(session)
}

/// Select the inbox in read-only mode
///
/// Uses `EXAMINE` to fetch mailbox state without marking messages as read.
/// Returns the mailbox status, including the message count used to compute
/// listing windows.
pub async fn examine_inbox(config: &AppConfig, session: &mut ImapSession) -> AppResult<Mailbox> {
    timeout(socket_timeout(config), session.examine("INBOX"))
        .await
        .map_err(|_| AppError::Timeout("EXAMINE timed out for INBOX".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::NotFound(format!("cannot examine INBOX: {e}"))))
}

/// Fetch messages by sequence set
///
/// Runs a plain `FETCH` for the given sequence set (e.g. `"5:20"` or `"1:*"`)
/// and collects all results. `BODY.PEEK` queries leave messages unread.
pub async fn fetch_sequence(
    config: &AppConfig,
    session: &mut ImapSession,
    sequence_set: &str,
    query: &str,
) -> AppResult<Vec<Fetch>> {
    let stream = timeout(socket_timeout(config), session.fetch(sequence_set, query))
        .await
        .map_err(|_| AppError::Timeout("FETCH timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("fetch failed: {e}"))))?;
    timeout(socket_timeout(config), stream.try_collect())
        .await
        .map_err(|_| AppError::Timeout("FETCH stream timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("fetch stream failed: {e}"))))
}

/// Fetch a single message by UID with custom query
///
/// Runs a `UID FETCH` for a specific UID and returns the first result.
///
/// # Errors
///
/// - `NotFound` if the UID does not exist in the mailbox
/// - `Timeout` or `Internal` for network/protocol errors
pub async fn uid_fetch_one(
    config: &AppConfig,
    session: &mut ImapSession,
    uid: &str,
    query: &str,
) -> AppResult<Fetch> {
    let stream = timeout(socket_timeout(config), session.uid_fetch(uid, query))
        .await
        .map_err(|_| AppError::Timeout("UID FETCH timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid fetch failed: {e}"))))?;
    let fetches: Vec<Fetch> = timeout(socket_timeout(config), stream.try_collect())
        .await
        .map_err(|_| AppError::Timeout("UID FETCH stream timed out".to_owned()))
        .and_then(|r| r.map_err(|e| AppError::Internal(format!("uid fetch stream failed: {e}"))))?;

    fetches
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("message uid {uid} not found")))
}

/// Fetch full RFC822 source for one message by sequence number
///
/// Returns raw bytes of the entire message.
pub async fn fetch_raw_by_sequence(
    config: &AppConfig,
    session: &mut ImapSession,
    sequence: u32,
) -> AppResult<Vec<u8>> {
    let fetches = fetch_sequence(config, session, &sequence.to_string(), "RFC822").await?;
    let fetch = fetches
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("message sequence {sequence} not found")))?;
    let body = fetch
        .body()
        .ok_or_else(|| AppError::Internal("message has no RFC822 body".to_owned()))?;
    Ok(body.to_vec())
}
