//! mail-reply-rs: AI-assisted email reply service
//!
//! This service lets a user browse an IMAP inbox, draft replies with a
//! language model from free-text instructions, and send or save those
//! replies, per configured mail account. All external systems (IMAP server,
//! model provider, SMTP relay) are reached over TLS with bounded timeouts.
//!
//! # Architecture
//!
//! - [`main`]: Process entry point with env loading and HTTP serving
//! - [`config`]: Environment-driven configuration for accounts, transports, and settings
//! - [`errors`]: Application error model with HTTP response mapping
//! - [`imap`]: IMAP transport/session operations with timeout wrappers
//! - [`mailbox`]: Inbox listing and single-message lookup with fallback strategies
//! - [`mime`]: Message parsing and normalization to plain strings
//! - [`models`]: Domain types and HTTP request/response DTOs
//! - [`compose`]: Language model calls and transcript management
//! - [`send`]: Outbound SMTP delivery and draft persistence
//! - [`store`]: Reply record repository over SQLite

mod compose;
mod config;
mod errors;
mod imap;
mod mailbox;
mod mime;
mod models;
mod send;
mod server;
mod store;

use config::AppConfig;
use server::AppState;
use store::ReplyStore;
use tracing_subscriber::EnvFilter;

/// Application entry point
///
/// Initializes tracing from environment, loads config, opens the reply
/// store, and serves the HTTP API until shutdown.
///
/// # Environment Variables
///
/// See [`AppConfig::load_from_env`] for full configuration options.
///
/// # Example
///
/// ```no_run
/// MAIL_IMAP_DEFAULT_HOST=imap.example.com \
/// MAIL_IMAP_DEFAULT_USER=user@example.com \
/// MAIL_IMAP_DEFAULT_PASS=secret \
/// MAIL_AI_KEY=sk-... \
/// cargo run
/// ```
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load_from_env()?;
    let store = ReplyStore::new(&config.database_path).await?;
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, store)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "serving inbox API");
    axum::serve(listener, server::router(state)).await?;
    Ok(())
}
