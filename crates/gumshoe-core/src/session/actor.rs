//! The single-writer serialization unit for one conversation key.
//!
//! A `SessionActor` drains its mailbox one command at a time and runs each
//! to completion before taking the next, so no two operations on the same
//! conversation ever interleave. It keeps no state beyond the key: every
//! command reads what it needs from the store, which makes a replacement
//! actor indistinguishable from the original.

use std::sync::{Arc, Weak};
use std::time::Duration;

use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey};
use gumshoe_types::error::ChatError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::RegistryInner;
use super::store::SessionStore;
use super::{ExchangeOutcome, SessionCommand, Turn};

/// What woke the actor up.
enum Wake {
    Command(SessionCommand),
    Idle,
    Closed,
    Shutdown,
}

pub(crate) struct SessionActor<S: SessionStore> {
    /// Registry-unique id, distinguishes this actor from its successors.
    id: u64,
    key: ConversationKey,
    store: Arc<S>,
    mailbox: mpsc::Receiver<SessionCommand>,
    registry: Weak<RegistryInner<S>>,
    idle_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl<S: SessionStore> SessionActor<S> {
    pub(crate) fn new(
        id: u64,
        key: ConversationKey,
        store: Arc<S>,
        mailbox: mpsc::Receiver<SessionCommand>,
        registry: Weak<RegistryInner<S>>,
        idle_timeout: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            id,
            key,
            store,
            mailbox,
            registry,
            idle_timeout,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        debug!(key = %self.key, actor_id = self.id, "session actor started");

        loop {
            match self.next().await {
                Wake::Command(command) => self.handle(command).await,
                Wake::Idle => {
                    self.retire().await;
                    break;
                }
                Wake::Closed | Wake::Shutdown => break,
            }
        }

        debug!(key = %self.key, actor_id = self.id, "session actor stopped");
    }

    async fn next(&mut self) -> Wake {
        let idle_timeout = self.idle_timeout;
        let mailbox = &mut self.mailbox;
        let shutdown = &self.shutdown;

        let recv = async move {
            match idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, mailbox.recv()).await {
                    Ok(Some(command)) => Wake::Command(command),
                    Ok(None) => Wake::Closed,
                    Err(_) => Wake::Idle,
                },
                None => match mailbox.recv().await {
                    Some(command) => Wake::Command(command),
                    None => Wake::Closed,
                },
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Wake::Shutdown,
            wake = recv => wake,
        }
    }

    async fn handle(&self, command: SessionCommand) {
        let op = command.name();
        debug!(key = %self.key, op, "session command");

        let delivered = match command {
            SessionCommand::Append {
                role,
                content,
                reply,
            } => reply.send(self.append(role, &content).await).is_ok(),
            SessionCommand::History { reply } => reply.send(self.history().await).is_ok(),
            SessionCommand::Reset { reply } => reply.send(self.reset().await).is_ok(),
            SessionCommand::Exchange { turn, reply } => {
                reply.send(self.exchange(turn).await).is_ok()
            }
        };

        if !delivered {
            debug!(key = %self.key, op, "caller went away before the reply was delivered");
        }
    }

    async fn append(&self, role: ChatRole, content: &str) -> Result<ChatMessage, ChatError> {
        Ok(self.store.append(&self.key, role, content).await?)
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.store.read_all(&self.key).await?)
    }

    async fn reset(&self) -> Result<(), ChatError> {
        self.store.reset(&self.key).await?;
        info!(key = %self.key, "conversation reset");
        Ok(())
    }

    /// Append user (and rebind) -> read log -> generate -> append assistant.
    ///
    /// A failed generation leaves the user message in place and appends
    /// nothing else; the error is returned unchanged. A failed user append
    /// leaves neither the message nor a new binding behind.
    async fn exchange(&self, turn: Turn) -> Result<ExchangeOutcome, ChatError> {
        let Turn {
            text,
            scenario: requested,
            responder,
        } = turn;

        let bound = match requested {
            Some(_) => None,
            None => self.store.scenario(&self.key).await?,
        };
        let user = self
            .store
            .append_user(&self.key, &text, requested.as_deref())
            .await?;
        let scenario = requested.or(bound);

        let log = self.store.read_all(&self.key).await?;

        let reply = match responder(&log, scenario.as_deref()).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(key = %self.key, sequence = user.sequence, error = %e, "reply generation failed");
                return Err(e);
            }
        };

        let assistant = self
            .store
            .append(&self.key, ChatRole::Assistant, &reply)
            .await?;

        Ok(ExchangeOutcome {
            user,
            assistant,
            scenario,
        })
    }

    /// Leave the registry after an idle period.
    ///
    /// The slot is removed before the mailbox closes so no new sender can be
    /// handed out for this actor. Commands that were already queued are not
    /// executed here; they are re-dispatched to the successor.
    async fn retire(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        registry.detach(&self.key, self.id);
        self.mailbox.close();
        debug!(key = %self.key, actor_id = self.id, "session actor retired after idle period");

        // recv() keeps yielding until every permit reserved before close() is used.
        while let Some(command) = self.mailbox.recv().await {
            if let Err((command, e)) = registry.dispatch(&self.key, command).await {
                command.fail(e);
            }
        }
    }
}

impl SessionCommand {
    /// Answer the command with an error without executing it.
    pub(crate) fn fail(self, error: ChatError) {
        match self {
            SessionCommand::Append { reply, .. } => {
                let _ = reply.send(Err(error));
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(Err(error));
            }
            SessionCommand::Reset { reply } => {
                let _ = reply.send(Err(error));
            }
            SessionCommand::Exchange { reply, .. } => {
                let _ = reply.send(Err(error));
            }
        }
    }
}
