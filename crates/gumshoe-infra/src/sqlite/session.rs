//! SQLite conversation store.
//!
//! Implements `SessionStore` from `gumshoe-core`. Writes go through the
//! single-connection writer pool inside a transaction; reads use the reader
//! pool. Private row structs map SQLite rows to domain types.

use chrono::{DateTime, Utc};
use gumshoe_core::session::SessionStore;
use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey, StoreStats};
use gumshoe_types::error::RepositoryError;
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Upsert the conversation row and insert the next message in one
    /// transaction. A `Some` scenario replaces the binding; `None` keeps it.
    async fn insert_message(
        &self,
        key: &ConversationKey,
        role: ChatRole,
        content: &str,
        scenario: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        let now = Utc::now();
        let stamp = format_datetime(&now);

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO conversations (key, scenario, created_at, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                   scenario = COALESCE(excluded.scenario, conversations.scenario),
                   updated_at = excluded.updated_at"#,
        )
        .bind(key.as_str())
        .bind(scenario)
        .bind(&stamp)
        .bind(&stamp)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        let next: i64 = sqlx::query(
            "SELECT COALESCE(MAX(sequence), 0) + 1 AS next FROM messages WHERE conversation_key = ?",
        )
        .bind(key.as_str())
        .fetch_one(&mut *tx)
        .await
        .and_then(|row| row.try_get("next"))
        .map_err(query_error)?;

        sqlx::query(
            r#"INSERT INTO messages (conversation_key, sequence, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(key.as_str())
        .bind(next)
        .bind(role.to_string())
        .bind(content)
        .bind(&stamp)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;

        Ok(ChatMessage {
            role,
            content: content.to_string(),
            sequence: next as u64,
            created_at: now,
        })
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MessageRow {
    sequence: i64,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            sequence: row.try_get("sequence")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: ChatRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let sequence = u64::try_from(self.sequence)
            .map_err(|_| RepositoryError::Query(format!("invalid sequence: {}", self.sequence)))?;

        Ok(ChatMessage {
            role,
            content: self.content,
            sequence,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(db.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::Connection
        }
        _ => RepositoryError::Query(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// SessionStore implementation
// ---------------------------------------------------------------------------

impl SessionStore for SqliteSessionStore {
    async fn append(
        &self,
        key: &ConversationKey,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        self.insert_message(key, role, content, None).await
    }

    async fn append_user(
        &self,
        key: &ConversationKey,
        content: &str,
        scenario: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        self.insert_message(key, ChatRole::User, content, scenario).await
    }

    async fn read_all(&self, key: &ConversationKey) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT sequence, role, content, created_at FROM messages
               WHERE conversation_key = ? ORDER BY sequence ASC"#,
        )
        .bind(key.as_str())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row = MessageRow::from_row(row).map_err(query_error)?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn reset(&self, key: &ConversationKey) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        sqlx::query("DELETE FROM messages WHERE conversation_key = ?")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        sqlx::query("DELETE FROM conversations WHERE key = ?")
            .bind(key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        tx.commit().await.map_err(query_error)
    }

    async fn scenario(&self, key: &ConversationKey) -> Result<Option<String>, RepositoryError> {
        let row = sqlx::query("SELECT scenario FROM conversations WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => row.try_get("scenario").map_err(query_error),
            None => Ok(None),
        }
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT COUNT(DISTINCT conversation_key) AS conversations, COUNT(*) AS messages
               FROM messages"#,
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let conversations: i64 = row.try_get("conversations").map_err(query_error)?;
        let messages: i64 = row.try_get("messages").map_err(query_error)?;

        Ok(StoreStats {
            conversations: conversations as u64,
            messages: messages as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::database_url;

    async fn test_store() -> (tempfile::TempDir, SqliteSessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::new(&database_url(dir.path())).await.unwrap();
        (dir, SqliteSessionStore::new(pool))
    }

    fn key(raw: &str) -> ConversationKey {
        ConversationKey::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_append_assigns_gapless_sequences() {
        let (_dir, store) = test_store().await;
        let k = key("conv_1");

        let first = store.append(&k, ChatRole::User, "Who killed Victor?").await.unwrap();
        let second = store
            .append(&k, ChatRole::Assistant, "Poison, pal. In the whiskey.")
            .await
            .unwrap();
        let third = store.append(&k, ChatRole::Narration, "Thunder.").await.unwrap();

        assert_eq!((first.sequence, second.sequence, third.sequence), (1, 2, 3));

        let log = store.read_all(&k).await.unwrap();
        assert_eq!(log, vec![first, second, third]);
    }

    #[tokio::test]
    async fn test_read_unknown_key_is_empty() {
        let (_dir, store) = test_store().await;
        assert!(store.read_all(&key("nobody")).await.unwrap().is_empty());
        assert!(store.scenario(&key("nobody")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (_dir, store) = test_store().await;
        let (a, b) = (key("a"), key("b"));

        store.append(&a, ChatRole::User, "a1").await.unwrap();
        store.append(&a, ChatRole::User, "a2").await.unwrap();
        let b1 = store.append(&b, ChatRole::User, "b1").await.unwrap();
        assert_eq!(b1.sequence, 1);

        store.reset(&a).await.unwrap();
        assert!(store.read_all(&a).await.unwrap().is_empty());
        assert_eq!(store.read_all(&b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_restarts_sequence_and_clears_binding() {
        let (_dir, store) = test_store().await;
        let k = key("conv_reset");

        store.append_user(&k, "one", Some("cipher")).await.unwrap();
        store.append(&k, ChatRole::User, "two").await.unwrap();

        store.reset(&k).await.unwrap();
        assert!(store.scenario(&k).await.unwrap().is_none());

        let msg = store.append(&k, ChatRole::User, "fresh").await.unwrap();
        assert_eq!(msg.sequence, 1);

        // Unknown keys reset cleanly.
        store.reset(&key("never-written")).await.unwrap();
    }

    #[tokio::test]
    async fn test_scenario_binding_survives_appends() {
        let (_dir, store) = test_store().await;
        let k = key("conv_bind");

        store.append_user(&k, "hello", Some("heist")).await.unwrap();
        store.append(&k, ChatRole::Assistant, "Evening.").await.unwrap();
        store.append_user(&k, "again", None).await.unwrap();
        assert_eq!(store.scenario(&k).await.unwrap().as_deref(), Some("heist"));

        let msg = store.append_user(&k, "new case", Some("murder")).await.unwrap();
        assert_eq!(msg.sequence, 4);
        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(store.scenario(&k).await.unwrap().as_deref(), Some("murder"));
    }

    #[tokio::test]
    async fn test_failed_user_append_keeps_previous_binding() {
        let (_dir, store) = test_store().await;
        let k = key("conv_atomic");
        store.append_user(&k, "hello", Some("dame")).await.unwrap();

        sqlx::query(
            r#"CREATE TRIGGER reject_boom BEFORE INSERT ON messages
               WHEN NEW.content = 'boom'
               BEGIN SELECT RAISE(ABORT, 'rejected'); END"#,
        )
        .execute(&store.pool().writer)
        .await
        .unwrap();

        let err = store.append_user(&k, "boom", Some("heist")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));

        assert_eq!(store.scenario(&k).await.unwrap().as_deref(), Some("dame"));
        assert_eq!(store.read_all(&k).await.unwrap().len(), 1);

        let fresh = key("conv_atomic_new");
        store.append_user(&fresh, "boom", Some("heist")).await.unwrap_err();
        assert!(store.scenario(&fresh).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sequence_is_a_conflict() {
        let (_dir, store) = test_store().await;
        let k = key("conv_dup");
        store.append(&k, ChatRole::User, "first").await.unwrap();

        let err = sqlx::query(
            "INSERT INTO messages (conversation_key, sequence, role, content, created_at) VALUES (?, 1, 'user', 'again', ?)",
        )
        .bind(k.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&store.pool().writer)
        .await
        .map_err(query_error)
        .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = database_url(dir.path());
        let k = key("conv_durable");

        {
            let store = SqliteSessionStore::new(DatabasePool::new(&url).await.unwrap());
            store.append(&k, ChatRole::User, "remember me").await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteSessionStore::new(DatabasePool::new(&url).await.unwrap());
        let log = store.read_all(&k).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "remember me");

        let next = store.append(&k, ChatRole::Assistant, "I never forget.").await.unwrap();
        assert_eq!(next.sequence, 2);
    }

    #[tokio::test]
    async fn test_stats() {
        let (_dir, store) = test_store().await;
        assert_eq!(store.stats().await.unwrap(), StoreStats::default());

        store.append(&key("a"), ChatRole::User, "1").await.unwrap();
        store.append(&key("a"), ChatRole::Assistant, "2").await.unwrap();
        store.append(&key("b"), ChatRole::User, "3").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.conversations, 2);
        assert_eq!(stats.messages, 3);
    }
}
