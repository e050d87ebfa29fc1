//! In-memory `SessionStore` for unit tests.
//!
//! Tracks how many operations are in flight per key so tests can assert that
//! the registry never lets two of them overlap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey, StoreStats};
use gumshoe_types::error::RepositoryError;

use super::store::SessionStore;

#[derive(Default)]
struct Partition {
    messages: Vec<ChatMessage>,
    scenario: Option<String>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    partitions: Mutex<HashMap<ConversationKey, Partition>>,
    failing: AtomicBool,
    op_delay: Option<Duration>,
}

impl MemoryStore {
    /// Sleep inside every operation, widening any window for overlap.
    pub(crate) fn with_op_delay(mut self, delay: Duration) -> Self {
        self.op_delay = Some(delay);
        self
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn max_concurrency(&self, key: &ConversationKey) -> usize {
        let partitions = self.partitions.lock().unwrap();
        partitions.get(key).map_or(0, |p| p.max_in_flight)
    }

    pub(crate) fn len(&self, key: &ConversationKey) -> usize {
        let partitions = self.partitions.lock().unwrap();
        partitions.get(key).map_or(0, |p| p.messages.len())
    }

    async fn guarded<T>(
        &self,
        key: &ConversationKey,
        op: impl FnOnce(&mut Partition) -> T,
    ) -> Result<T, RepositoryError> {
        {
            let mut partitions = self.partitions.lock().unwrap();
            let partition = partitions.entry(key.clone()).or_default();
            partition.in_flight += 1;
            partition.max_in_flight = partition.max_in_flight.max(partition.in_flight);
        }

        match self.op_delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }

        let mut partitions = self.partitions.lock().unwrap();
        let partition = partitions.entry(key.clone()).or_default();
        partition.in_flight -= 1;

        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk unavailable".to_string()));
        }
        Ok(op(partition))
    }
}

impl SessionStore for MemoryStore {
    async fn append(
        &self,
        key: &ConversationKey,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        self.guarded(key, |p| {
            let message = ChatMessage {
                role,
                content: content.to_string(),
                sequence: p.messages.len() as u64 + 1,
                created_at: Utc::now(),
            };
            p.messages.push(message.clone());
            message
        })
        .await
    }

    async fn read_all(&self, key: &ConversationKey) -> Result<Vec<ChatMessage>, RepositoryError> {
        self.guarded(key, |p| p.messages.clone()).await
    }

    async fn reset(&self, key: &ConversationKey) -> Result<(), RepositoryError> {
        self.guarded(key, |p| {
            p.messages.clear();
            p.scenario = None;
        })
        .await
    }

    async fn scenario(&self, key: &ConversationKey) -> Result<Option<String>, RepositoryError> {
        self.guarded(key, |p| p.scenario.clone()).await
    }

    async fn append_user(
        &self,
        key: &ConversationKey,
        content: &str,
        scenario: Option<&str>,
    ) -> Result<ChatMessage, RepositoryError> {
        self.guarded(key, |p| {
            if let Some(id) = scenario {
                p.scenario = Some(id.to_string());
            }
            let message = ChatMessage {
                role: ChatRole::User,
                content: content.to_string(),
                sequence: p.messages.len() as u64 + 1,
                created_at: Utc::now(),
            };
            p.messages.push(message.clone());
            message
        })
        .await
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let partitions = self.partitions.lock().unwrap();
        let live = partitions.values().filter(|p| !p.messages.is_empty());
        Ok(StoreStats {
            conversations: live.clone().count() as u64,
            messages: live.map(|p| p.messages.len() as u64).sum(),
        })
    }
}
