//! SessionStore trait definition.
//!
//! Durable, ordered, append-only persistence of one conversation log per
//! key. Follows the same RPITIT pattern as `LlmProvider`.

use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey, StoreStats};
use gumshoe_types::error::RepositoryError;

/// Repository trait for conversation log persistence.
///
/// Implementations live in gumshoe-infra (e.g., `SqliteSessionStore`).
/// Implementations may assume a single writer per key: every mutating call
/// for a given key is issued by that key's session actor, one at a time.
pub trait SessionStore: Send + Sync + 'static {
    /// Append a message, assigning the next sequence number for `key`.
    ///
    /// The write is atomic: a failure leaves no partial entry visible.
    fn append(
        &self,
        key: &ConversationKey,
        role: ChatRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// All messages for `key` in ascending sequence order (empty if unknown).
    fn read_all(
        &self,
        key: &ConversationKey,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Atomically discard the log and scenario binding for `key`.
    ///
    /// Succeeds for keys that were never written.
    fn reset(
        &self,
        key: &ConversationKey,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Scenario bound to `key`, if any.
    fn scenario(
        &self,
        key: &ConversationKey,
    ) -> impl std::future::Future<Output = Result<Option<String>, RepositoryError>> + Send;

    /// Append a user message, rebinding `key` to `scenario` when one is given.
    ///
    /// The binding and the message are written atomically: on failure neither
    /// is visible. With `None` the existing binding is left untouched.
    fn append_user(
        &self,
        key: &ConversationKey,
        content: &str,
        scenario: Option<&str>,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Count conversations and messages across all keys.
    fn stats(&self) -> impl std::future::Future<Output = Result<StoreStats, RepositoryError>> + Send;
}
