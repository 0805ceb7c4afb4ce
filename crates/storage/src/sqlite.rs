//! Durable storage backend on SQLite
//!
//! Tables:
//!
//! - `tokens` - issued bearer tokens
//! - `queues` - queue ownership; rowid is the registration order
//! - `messages` - one row per queue a message surfaces in; a message posted
//!   to a domain queue gets a second row under the owner's personal queue
//! - `edge_nodes` - node registry; rowid is the load tie-break and survives
//!   load refreshes
//!
//! SQLite serializes writers, which gives the per-queue append-then-read
//! linearizability the HTTP layer relies on.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::info;

use courier_protocol::{Message, MessageKey, QueueId, Timestamp, Token};

use crate::error::{Result, StorageError};
use crate::Storage;

/// SQLite-backed storage
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open or create a store at the given path
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Backend(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "storage opened");
        Ok(store)
    }

    /// Create an in-memory store (for tests)
    pub async fn in_memory() -> Result<Self> {
        // A single connection keeps every query on the same memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                token TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queues (
                queue_id TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                domain TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_queues_token ON queues(token)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                surface_queue TEXT NOT NULL,
                key TEXT NOT NULL,
                origin_queue TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (surface_queue, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_queue_ts \
             ON messages(surface_queue, timestamp)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS edge_nodes (
                address TEXT PRIMARY KEY,
                load INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Latest personal queue (empty domain) registered for a token
    async fn personal_queue(&self, token: &Token) -> Result<Option<QueueId>> {
        let row = sqlx::query(
            "SELECT queue_id FROM queues \
             WHERE token = ? AND domain = '' \
             ORDER BY rowid DESC LIMIT 1",
        )
        .bind(token.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| QueueId::new(r.get::<String, _>("queue_id"))))
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn new_token(&self) -> Result<Token> {
        loop {
            let token = Token::generate();
            let result = sqlx::query("INSERT OR IGNORE INTO tokens (token) VALUES (?)")
                .bind(token.as_str())
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 1 {
                return Ok(token);
            }
        }
    }

    async fn new_queue(&self, queue_id: &QueueId, token: &Token, domain: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO queues (queue_id, token, domain) VALUES (?, ?, ?)")
            .bind(queue_id.as_str())
            .bind(token.as_str())
            .bind(domain)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn user_owns_queue(&self, token: &Token, queue_id: &QueueId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM queues WHERE queue_id = ? AND token = ?")
            .bind(queue_id.as_str())
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn domain_owns_queue(&self, domain: &str, queue_id: &QueueId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM queues WHERE queue_id = ? AND domain = ?")
            .bind(queue_id.as_str())
            .bind(domain)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn get_user_for_queue(&self, queue_id: &QueueId) -> Result<Option<Token>> {
        let row = sqlx::query("SELECT token FROM queues WHERE queue_id = ?")
            .bind(queue_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Token::new(r.get::<String, _>("token"))))
    }

    async fn get_queues(&self, token: &Token) -> Result<BTreeMap<String, QueueId>> {
        let rows = sqlx::query(
            "SELECT domain, queue_id FROM queues \
             WHERE token = ? AND domain <> '' \
             ORDER BY rowid ASC",
        )
        .bind(token.as_str())
        .fetch_all(&self.pool)
        .await?;

        // Ascending registration order: later rows supersede earlier ones
        let mut map = BTreeMap::new();
        for row in rows {
            map.insert(
                row.get::<String, _>("domain"),
                QueueId::new(row.get::<String, _>("queue_id")),
            );
        }
        Ok(map)
    }

    async fn delete_queue(&self, queue_id: &QueueId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM queues WHERE queue_id = ?")
            .bind(queue_id.as_str())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::QueueNotFound);
        }

        sqlx::query("DELETE FROM messages WHERE surface_queue = ?")
            .bind(queue_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn new_message(&self, queue_id: &QueueId, body: serde_json::Value) -> Result<Message> {
        let owner = self
            .get_user_for_queue(queue_id)
            .await?
            .ok_or(StorageError::QueueNotFound)?;
        let personal = self.personal_queue(&owner).await?;

        let message = Message::new(queue_id, body);
        let body_text = serde_json::to_string(&message.body)
            .map_err(|e| StorageError::Backend(format!("body serialization: {e}")))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO messages (surface_queue, key, origin_queue, timestamp, body) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(queue_id.as_str())
        .bind(message.key.as_str())
        .bind(queue_id.as_str())
        .bind(message.timestamp)
        .bind(&body_text)
        .execute(&mut *tx)
        .await?;

        if let Some(personal) = personal {
            if personal != *queue_id {
                sqlx::query(
                    "INSERT INTO messages (surface_queue, key, origin_queue, timestamp, body) \
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(personal.as_str())
                .bind(message.key.as_str())
                .bind(queue_id.as_str())
                .bind(message.timestamp)
                .bind(&body_text)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(message)
    }

    async fn get_messages(
        &self,
        queue_id: &QueueId,
        since: Option<Timestamp>,
    ) -> Result<Vec<Message>> {
        if self.get_user_for_queue(queue_id).await?.is_none() {
            return Err(StorageError::QueueNotFound);
        }

        let rows = match since {
            Some(ts) => {
                sqlx::query(
                    "SELECT key, origin_queue, timestamp, body FROM messages \
                     WHERE surface_queue = ? AND timestamp > ? \
                     ORDER BY timestamp ASC, key ASC",
                )
                .bind(queue_id.as_str())
                .bind(ts)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT key, origin_queue, timestamp, body FROM messages \
                     WHERE surface_queue = ? \
                     ORDER BY timestamp ASC, key ASC",
                )
                .bind(queue_id.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            let body: serde_json::Value = serde_json::from_str(&row.get::<String, _>("body"))
                .map_err(|e| StorageError::Backend(format!("stored body corrupt: {e}")))?;
            messages.push(Message {
                key: MessageKey::new(row.get::<String, _>("key")),
                timestamp: row.get::<i64, _>("timestamp"),
                queue: QueueId::new(row.get::<String, _>("origin_queue")),
                body,
            });
        }
        Ok(messages)
    }

    async fn add_edge_node(&self, address: &str, load: u32) -> Result<()> {
        sqlx::query(
            "INSERT INTO edge_nodes (address, load) VALUES (?, ?) \
             ON CONFLICT(address) DO UPDATE SET load = excluded.load",
        )
        .bind(address)
        .bind(load as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_edge_nodes(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT address FROM edge_nodes ORDER BY load ASC, rowid ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| r.get::<String, _>("address"))
            .collect())
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
