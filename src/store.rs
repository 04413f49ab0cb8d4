//! Reply storage repository
//!
//! Single upsert-by-key persistence boundary over [`ReplyRecord`], keyed by
//! (email id, account). Draft upserts replace the reply and transcript and
//! never touch `sent_at`; `sent_at` is set once on a confirmed send and never
//! reset afterwards.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::warn;

use crate::errors::{AppError, AppResult};
use crate::models::{ReplyRecord, Transcript};

/// Repository for draft/sent reply storage
#[derive(Clone)]
pub struct ReplyStore {
    pool: SqlitePool,
}

impl ReplyStore {
    /// Create a new repository with the given database path
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails.
    pub async fn new(database_path: &str) -> AppResult<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory repository for testing
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema creation fails.
    #[allow(dead_code)]
    pub async fn in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema
    async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id TEXT NOT NULL,
                account TEXT NOT NULL DEFAULT 'default',
                latest_reply TEXT NOT NULL,
                chat_history TEXT NOT NULL DEFAULT '[]',
                sent_at TEXT,
                updated_at TEXT NOT NULL,
                UNIQUE(email_id, account)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Upsert the draft reply and transcript for an email
    ///
    /// `sent_at` is left untouched: absent for new records, preserved for
    /// records that were already sent.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database query fails.
    pub async fn upsert_draft(
        &self,
        email_id: &str,
        account: &str,
        latest_reply: &str,
        transcript: &Transcript,
    ) -> AppResult<ReplyRecord> {
        let history = serde_json::to_string(transcript)
            .map_err(|e| AppError::Internal(format!("transcript encode: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO email_replies (email_id, account, latest_reply, chat_history, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(email_id, account) DO UPDATE SET
                latest_reply = excluded.latest_reply,
                chat_history = excluded.chat_history,
                updated_at = excluded.updated_at
            ",
        )
        .bind(email_id)
        .bind(account)
        .bind(latest_reply)
        .bind(&history)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(ReplyRecord {
            email_id: email_id.to_owned(),
            account: account.to_owned(),
            latest_reply: latest_reply.to_owned(),
            transcript: transcript.clone(),
            sent_at: self
                .find(email_id, account)
                .await?
                .and_then(|record| record.sent_at),
        })
    }

    /// Record a confirmed send
    ///
    /// Upserts the reply text and stamps `sent_at` with the current time. On
    /// conflict the existing `sent_at` wins, so the timestamp only ever
    /// transitions absent → set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_sent(&self, email_id: &str, account: &str, latest_reply: &str) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r"
            INSERT INTO email_replies (email_id, account, latest_reply, chat_history, sent_at, updated_at)
            VALUES (?, ?, ?, '[]', ?, ?)
            ON CONFLICT(email_id, account) DO UPDATE SET
                latest_reply = excluded.latest_reply,
                sent_at = COALESCE(email_replies.sent_at, excluded.sent_at),
                updated_at = excluded.updated_at
            ",
        )
        .bind(email_id)
        .bind(account)
        .bind(latest_reply)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find the reply record for an email, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, email_id: &str, account: &str) -> AppResult<Option<ReplyRecord>> {
        let row = sqlx::query(
            r"
            SELECT email_id, account, latest_reply, chat_history, sent_at
            FROM email_replies
            WHERE email_id = ? AND account = ?
            ",
        )
        .bind(email_id)
        .bind(account)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| {
            let history: String = row.get("chat_history");
            let transcript: Transcript = serde_json::from_str(&history).unwrap_or_else(|e| {
                warn!(email_id, account, error = %e, "stored transcript is unreadable");
                Transcript::new()
            });
            let sent_at: Option<String> = row.get("sent_at");

            ReplyRecord {
                email_id: row.get("email_id"),
                account: row.get("account"),
                latest_reply: row.get("latest_reply"),
                transcript,
                sent_at: sent_at.and_then(|s| {
                    DateTime::parse_from_rfc3339(&s)
                        .ok()
                        .map(|d| d.with_timezone(&Utc))
                }),
            }
        }))
    }
}
