//! Per-conversation session actors.
//!
//! Every conversation key is served by exactly one [`actor::SessionActor`]
//! at a time. The [`registry::SessionRegistry`] maps keys to actor mailboxes,
//! spawning actors lazily, and all reads and writes for a key travel through
//! that mailbox so they execute one at a time in arrival order. Different keys
//! never share a lock.

pub mod actor;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

use futures_util::future::BoxFuture;
use gumshoe_types::chat::{ChatMessage, ChatRole};
use gumshoe_types::error::ChatError;
use tokio::sync::oneshot;

pub use registry::{RegistrySettings, SessionRegistry};
pub use store::SessionStore;

/// Future producing the assistant reply for one exchange.
pub type ReplyFuture = BoxFuture<'static, Result<String, ChatError>>;

/// Produces the assistant reply from the conversation log and the effective
/// scenario id.
///
/// Called by the actor after the user message has been appended, with the
/// full log including that message. The returned future runs while the actor
/// holds the conversation, so it should carry its own timeout.
pub type Responder = Box<dyn FnOnce(&[ChatMessage], Option<&str>) -> ReplyFuture + Send>;

/// One chat turn to be executed by a session actor as a single unit.
pub struct Turn {
    /// Already validated user text.
    pub text: String,
    /// Scenario supplied with the request; rebinds the conversation when set.
    pub scenario: Option<String>,
    pub responder: Responder,
}

impl std::fmt::Debug for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Turn")
            .field("text", &self.text)
            .field("scenario", &self.scenario)
            .field("responder", &"<responder>")
            .finish()
    }
}

/// Result of a completed exchange.
#[derive(Debug, Clone)]
pub struct ExchangeOutcome {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
    /// Scenario the reply was generated under (`None` means catalog default).
    pub scenario: Option<String>,
}

type Reply<T> = oneshot::Sender<Result<T, ChatError>>;

/// Operations accepted by a session actor's mailbox.
pub(crate) enum SessionCommand {
    Append {
        role: ChatRole,
        content: String,
        reply: Reply<ChatMessage>,
    },
    History {
        reply: Reply<Vec<ChatMessage>>,
    },
    Reset {
        reply: Reply<()>,
    },
    Exchange {
        turn: Turn,
        reply: Reply<ExchangeOutcome>,
    },
}

impl SessionCommand {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            SessionCommand::Append { .. } => "append",
            SessionCommand::History { .. } => "history",
            SessionCommand::Reset { .. } => "reset",
            SessionCommand::Exchange { .. } => "exchange",
        }
    }
}
