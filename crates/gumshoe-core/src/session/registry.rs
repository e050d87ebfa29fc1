//! Key-to-mailbox registry for session actors.
//!
//! `SessionRegistry` hands every conversation key its own bounded `mpsc`
//! mailbox drained by a single [`SessionActor`]. Actors are spawned on first
//! use. A slot whose actor has gone away (idle retirement or a panic) is
//! replaced on the next dispatch, and a command that could not be delivered
//! is handed back and retried against the replacement, so no command is ever
//! executed twice or by two actors at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey};
use gumshoe_types::error::ChatError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::actor::SessionActor;
use super::store::SessionStore;
use super::{ExchangeOutcome, SessionCommand, Turn};

/// Attempts to deliver a command before giving up.
///
/// Only exceeded if replacement actors keep exiting immediately.
const MAX_DISPATCH_ATTEMPTS: usize = 4;

/// Shortest accepted idle timeout. Anything lower is raised to this.
pub const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Tuning knobs for session actors.
#[derive(Debug, Clone, Copy)]
pub struct RegistrySettings {
    /// Bounded mailbox size per actor; senders wait when it is full.
    pub mailbox_capacity: usize,
    /// Retire actors idle for this long; `None` keeps them forever.
    ///
    /// Commands queued on an actor as it retires are forwarded to its
    /// successor and may run after requests that reached the successor first.
    /// Values below [`MIN_IDLE_TIMEOUT`] are raised to it.
    pub idle_timeout: Option<Duration>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            idle_timeout: None,
        }
    }
}

fn clamp_idle_timeout(idle: Duration) -> Duration {
    if idle < MIN_IDLE_TIMEOUT {
        warn!(?idle, minimum = ?MIN_IDLE_TIMEOUT, "idle timeout too short, raising to minimum");
        MIN_IDLE_TIMEOUT
    } else {
        idle
    }
}

#[derive(Clone)]
struct ActorSlot {
    id: u64,
    mailbox: mpsc::Sender<SessionCommand>,
}

pub(crate) struct RegistryInner<S: SessionStore> {
    store: Arc<S>,
    slots: DashMap<ConversationKey, ActorSlot>,
    next_id: AtomicU64,
    settings: RegistrySettings,
    shutdown: CancellationToken,
}

/// Routes operations for each conversation key to that key's session actor.
///
/// Cloning produces another handle to the same registry.
pub struct SessionRegistry<S: SessionStore> {
    inner: Arc<RegistryInner<S>>,
}

impl<S: SessionStore> Clone for SessionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SessionStore> SessionRegistry<S> {
    pub fn new(store: Arc<S>, settings: RegistrySettings) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                store,
                slots: DashMap::new(),
                next_id: AtomicU64::new(1),
                settings: RegistrySettings {
                    mailbox_capacity: settings.mailbox_capacity.max(1),
                    idle_timeout: settings.idle_timeout.map(clamp_idle_timeout),
                },
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// The store every actor writes through.
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    /// Number of keys that currently have a live actor.
    pub fn active_sessions(&self) -> usize {
        self.inner
            .slots
            .iter()
            .filter(|slot| !slot.mailbox.is_closed())
            .count()
    }

    /// Stop every actor after its in-flight command; later calls fail.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }

    pub async fn append(
        &self,
        key: &ConversationKey,
        role: ChatRole,
        content: String,
    ) -> Result<ChatMessage, ChatError> {
        self.call(key, |reply| SessionCommand::Append {
            role,
            content,
            reply,
        })
        .await
    }

    pub async fn history(&self, key: &ConversationKey) -> Result<Vec<ChatMessage>, ChatError> {
        self.call(key, |reply| SessionCommand::History { reply }).await
    }

    pub async fn reset(&self, key: &ConversationKey) -> Result<(), ChatError> {
        self.call(key, |reply| SessionCommand::Reset { reply }).await
    }

    /// Run one full chat turn on the key's actor.
    ///
    /// Once admitted to the mailbox the turn runs to completion even if the
    /// caller stops waiting.
    pub async fn exchange(
        &self,
        key: &ConversationKey,
        turn: Turn,
    ) -> Result<ExchangeOutcome, ChatError> {
        self.call(key, |reply| SessionCommand::Exchange { turn, reply })
            .await
    }

    async fn call<T>(
        &self,
        key: &ConversationKey,
        command: impl FnOnce(oneshot::Sender<Result<T, ChatError>>) -> SessionCommand,
    ) -> Result<T, ChatError> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.inner
            .dispatch(key, command(reply_tx))
            .await
            .map_err(|(_, e)| e)?;

        reply_rx.await.map_err(|_| {
            ChatError::StorageFailure(format!("session actor for '{key}' stopped before replying"))
        })?
    }
}

impl<S: SessionStore> RegistryInner<S> {
    /// Deliver a command to the key's actor, spawning or replacing it as needed.
    ///
    /// On failure the undelivered command is handed back with the error.
    pub(crate) async fn dispatch(
        self: &Arc<Self>,
        key: &ConversationKey,
        mut command: SessionCommand,
    ) -> Result<(), (SessionCommand, ChatError)> {
        for _ in 0..MAX_DISPATCH_ATTEMPTS {
            if self.shutdown.is_cancelled() {
                break;
            }

            let slot = self.slot(key);
            match slot.mailbox.send(command).await {
                Ok(()) => return Ok(()),
                Err(mpsc::error::SendError(returned)) => {
                    debug!(key = %key, actor_id = slot.id, "session actor gone, replacing");
                    self.detach(key, slot.id);
                    command = returned;
                }
            }
        }

        let e = ChatError::StorageFailure(format!("no session actor available for '{key}'"));
        Err((command, e))
    }

    /// Remove the slot for `key` if it still belongs to actor `id`.
    pub(crate) fn detach(&self, key: &ConversationKey, id: u64) {
        self.slots.remove_if(key, |_, slot| slot.id == id);
    }

    fn slot(self: &Arc<Self>, key: &ConversationKey) -> ActorSlot {
        if let Some(slot) = self.slots.get(key) {
            if !slot.mailbox.is_closed() {
                return slot.clone();
            }
        }

        match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().mailbox.is_closed() {
                    let slot = self.spawn(key);
                    occupied.insert(slot.clone());
                    slot
                } else {
                    occupied.get().clone()
                }
            }
            Entry::Vacant(vacant) => {
                let slot = self.spawn(key);
                vacant.insert(slot.clone());
                slot
            }
        }
    }

    /// Must be called with the key's map entry locked.
    fn spawn(self: &Arc<Self>, key: &ConversationKey) -> ActorSlot {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.settings.mailbox_capacity);

        let actor = SessionActor::new(
            id,
            key.clone(),
            Arc::clone(&self.store),
            rx,
            Arc::downgrade(self),
            self.settings.idle_timeout,
            self.shutdown.child_token(),
        );
        tokio::spawn(actor.run());

        debug!(key = %key, actor_id = id, "spawned session actor");
        ActorSlot { id, mailbox: tx }
    }
}
