//! Context assembly for generation requests.
//!
//! The backend sees a single `system` instruction followed by the trailing
//! window of the conversation log. The instruction is never written to the
//! log; it is rebuilt from the scenario catalog on every turn.

use gumshoe_types::chat::{ChatMessage, ChatRole};
use gumshoe_types::llm::{Message, MessageRole};

/// Number of trailing log entries sent to the backend by default.
pub const DEFAULT_WINDOW: usize = 15;

/// Builds the message list for one generation request.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    window: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ContextAssembler {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `[system: instruction] ++ last N entries of log`, in log order.
    ///
    /// Narration entries keep their position and are sent as `system`
    /// messages, since the backend has no narration role.
    pub fn assemble(&self, log: &[ChatMessage], instruction: &str) -> Vec<Message> {
        let start = log.len().saturating_sub(self.window);
        let tail = &log[start..];

        let mut messages = Vec::with_capacity(tail.len() + 1);
        messages.push(Message::new(MessageRole::System, instruction));
        messages.extend(
            tail.iter()
                .map(|entry| Message::new(backend_role(entry.role), entry.content.clone())),
        );
        messages
    }
}

fn backend_role(role: ChatRole) -> MessageRole {
    match role {
        ChatRole::User => MessageRole::User,
        ChatRole::Assistant => MessageRole::Assistant,
        ChatRole::Narration => MessageRole::System,
    }
}
