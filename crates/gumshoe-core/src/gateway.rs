//! Chat gateway: the operations exposed to transports.
//!
//! `ChatGateway` validates input, resolves the session actor for a key and
//! runs each operation through it. A chat turn is handed to the actor as one
//! [`Turn`] whose responder assembles the context window, calls the backend
//! under a timeout and returns the reply text; the actor takes care of both
//! appends.

use std::sync::Arc;
use std::time::Duration;

use gumshoe_types::chat::{ChatMessage, ChatRole, ConversationKey, StoreStats};
use gumshoe_types::config::{BackendConfig, SessionConfig};
use gumshoe_types::error::ChatError;
use gumshoe_types::llm::CompletionRequest;
use gumshoe_types::scenario::ScenarioSummary;
use serde::Serialize;
use tracing::info;

use crate::context::ContextAssembler;
use crate::llm::BoxLlmProvider;
use crate::scenario::ScenarioCatalog;
use crate::session::{ReplyFuture, RegistrySettings, Responder, SessionRegistry, SessionStore, Turn};

/// Per-request limits and backend parameters.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub backend_timeout: Duration,
    pub context_window: usize,
    /// Longest accepted message text, in characters.
    pub max_message_chars: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default(), &BackendConfig::default())
    }
}

impl GatewaySettings {
    pub fn from_config(session: &SessionConfig, backend: &BackendConfig) -> Self {
        Self {
            model: backend.model.clone(),
            max_tokens: backend.max_tokens,
            temperature: backend.temperature,
            backend_timeout: Duration::from_secs(backend.timeout_secs),
            context_window: session.context_window,
            max_message_chars: session.max_message_chars,
        }
    }
}

impl From<&SessionConfig> for RegistrySettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            mailbox_capacity: config.mailbox_capacity,
            idle_timeout: config.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Successful chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub assistant_text: String,
    pub conversation_key: String,
    /// Sequence number of the assistant entry.
    pub sequence: u64,
    /// Scenario the reply was generated under.
    pub scenario: String,
}

pub struct ChatGateway<S: SessionStore> {
    sessions: SessionRegistry<S>,
    provider: Arc<BoxLlmProvider>,
    catalog: Arc<dyn ScenarioCatalog>,
    assembler: ContextAssembler,
    settings: GatewaySettings,
}

impl<S: SessionStore> ChatGateway<S> {
    pub fn new(
        sessions: SessionRegistry<S>,
        provider: Arc<BoxLlmProvider>,
        catalog: Arc<dyn ScenarioCatalog>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            sessions,
            provider,
            catalog,
            assembler: ContextAssembler::new(settings.context_window),
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry<S> {
        &self.sessions
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run one chat turn for `key`.
    ///
    /// On a backend failure or timeout the user message stays in the log and
    /// nothing else is appended. The caller may resubmit.
    pub async fn chat(
        &self,
        key: &str,
        text: &str,
        scenario: Option<&str>,
    ) -> Result<ChatReply, ChatError> {
        let key = ConversationKey::parse(key)?;
        let text = self.validate_text(text)?;
        let scenario = scenario
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let turn = Turn {
            text,
            scenario,
            responder: self.responder(),
        };
        let outcome = self.sessions.exchange(&key, turn).await?;

        let scenario = self.effective_scenario(outcome.scenario.as_deref());
        info!(
            key = %key,
            sequence = outcome.assistant.sequence,
            scenario = %scenario,
            "chat turn completed"
        );

        Ok(ChatReply {
            assistant_text: outcome.assistant.content,
            conversation_key: key.into(),
            sequence: outcome.assistant.sequence,
            scenario,
        })
    }

    /// Discard the log and scenario binding for `key`. Idempotent.
    pub async fn reset(&self, key: &str) -> Result<(), ChatError> {
        let key = ConversationKey::parse(key)?;
        self.sessions.reset(&key).await
    }

    /// Full log for `key` in sequence order; empty if never written.
    pub async fn history(&self, key: &str) -> Result<Vec<ChatMessage>, ChatError> {
        let key = ConversationKey::parse(key)?;
        self.sessions.history(&key).await
    }

    /// Append a narration entry without calling the backend.
    pub async fn narrate(&self, key: &str, text: &str) -> Result<ChatMessage, ChatError> {
        let key = ConversationKey::parse(key)?;
        let text = self.validate_text(text)?;
        self.sessions.append(&key, ChatRole::Narration, text).await
    }

    pub fn scenarios(&self) -> Vec<ScenarioSummary> {
        self.catalog.list()
    }

    pub async fn stats(&self) -> Result<StoreStats, ChatError> {
        Ok(self.sessions.store().stats().await?)
    }

    fn validate_text(&self, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::InvalidInput("message text must not be empty".to_string()));
        }
        if text.chars().count() > self.settings.max_message_chars {
            return Err(ChatError::InvalidInput(format!(
                "message text exceeds {} characters",
                self.settings.max_message_chars
            )));
        }
        Ok(text.to_string())
    }

    fn effective_scenario(&self, bound: Option<&str>) -> String {
        bound
            .and_then(|id| self.catalog.get(id))
            .unwrap_or_else(|| self.catalog.default_scenario())
            .id
            .clone()
    }

    fn responder(&self) -> Responder {
        let provider = Arc::clone(&self.provider);
        let catalog = Arc::clone(&self.catalog);
        let assembler = self.assembler;
        let settings = self.settings.clone();

        Box::new(move |log: &[ChatMessage], scenario: Option<&str>| -> ReplyFuture {
            let request = CompletionRequest {
                model: settings.model,
                messages: assembler.assemble(log, catalog.instruction(scenario)),
                max_tokens: settings.max_tokens,
                temperature: settings.temperature,
            };
            let budget = settings.backend_timeout;

            Box::pin(async move {
                let response = tokio::time::timeout(budget, provider.complete(&request))
                    .await
                    .map_err(|_| ChatError::BackendTimeout(budget))??;

                let reply = response.content.trim();
                if reply.is_empty() {
                    return Err(ChatError::BackendFailure(
                        "backend returned an empty reply".to_string(),
                    ));
                }
                Ok(reply.to_string())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use gumshoe_types::llm::{CompletionResponse, LlmError, MessageRole, StopReason, Usage};

    use super::*;
    use crate::llm::LlmProvider;
    use crate::scenario::PresetCatalog;
    use crate::session::testing::MemoryStore;

    enum Step {
        Reply(&'static str),
        Fail,
        Stall,
    }

    #[derive(Default)]
    struct Script {
        steps: Mutex<VecDeque<Step>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    /// Provider that plays back a fixed script and records every request.
    #[derive(Clone, Default)]
    struct ScriptedProvider {
        script: Arc<Script>,
    }

    impl ScriptedProvider {
        fn push(&self, step: Step) {
            self.script.steps.lock().unwrap().push_back(step);
        }

        fn last_request(&self) -> CompletionRequest {
            self.script.requests.lock().unwrap().last().cloned().unwrap()
        }

        fn calls(&self) -> usize {
            self.script.requests.lock().unwrap().len()
        }
    }

    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.script.requests.lock().unwrap().push(request.clone());
            let step = self.script.steps.lock().unwrap().pop_front();

            let content = match step {
                Some(Step::Reply(text)) => text.to_string(),
                Some(Step::Fail) => {
                    return Err(LlmError::Provider {
                        message: "upstream returned 500".to_string(),
                    });
                }
                Some(Step::Stall) => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    "too late".to_string()
                }
                None => "Nothing more to say, pal.".to_string(),
            };

            Ok(CompletionResponse {
                id: "resp-1".to_string(),
                content,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    fn gateway(provider: &ScriptedProvider) -> ChatGateway<MemoryStore> {
        gateway_with(provider, GatewaySettings::default())
    }

    fn gateway_with(
        provider: &ScriptedProvider,
        settings: GatewaySettings,
    ) -> ChatGateway<MemoryStore> {
        ChatGateway::new(
            SessionRegistry::new(Arc::new(MemoryStore::default()), RegistrySettings::default()),
            Arc::new(BoxLlmProvider::new(provider.clone())),
            Arc::new(PresetCatalog::builtin()),
            settings,
        )
    }

    #[tokio::test]
    async fn test_chat_appends_both_sides() {
        let provider = ScriptedProvider::default();
        provider.push(Step::Reply("  The rain never stops in this town.  "));
        let gw = gateway(&provider);

        let reply = gw.chat("conv_1", "Who's there?", None).await.unwrap();
        assert_eq!(reply.assistant_text, "The rain never stops in this town.");
        assert_eq!(reply.conversation_key, "conv_1");
        assert_eq!(reply.sequence, 2);
        assert_eq!(reply.scenario, "freeform");

        let log = gw.history("conv_1").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, ChatRole::User);
        assert_eq!(log[0].content, "Who's there?");
        assert_eq!(log[1].role, ChatRole::Assistant);

        let request = provider.last_request();
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, 150);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert!(request.messages[0].content.contains("THE CASE: None yet"));
        assert_eq!(request.messages[1].content, "Who's there?");
    }

    #[tokio::test]
    async fn test_invalid_input_changes_nothing() {
        let provider = ScriptedProvider::default();
        let gw = gateway_with(
            &provider,
            GatewaySettings {
                max_message_chars: 10,
                ..GatewaySettings::default()
            },
        );

        for text in ["", "   \n\t"] {
            let err = gw.chat("conv_1", text, None).await.unwrap_err();
            assert!(matches!(err, ChatError::InvalidInput(_)));
        }
        let err = gw.chat("conv_1", "far too long for this", None).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(_)));

        let err = gw.chat("bad key", "hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::InvalidInput(_)));
        assert!(matches!(gw.history("").await, Err(ChatError::InvalidInput(_))));

        assert!(gw.history("conv_1").await.unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_timeout_keeps_user_message_and_allows_retry() {
        let provider = ScriptedProvider::default();
        provider.push(Step::Stall);
        provider.push(Step::Reply("Took you long enough."));
        let gw = gateway_with(
            &provider,
            GatewaySettings {
                backend_timeout: Duration::from_millis(50),
                ..GatewaySettings::default()
            },
        );

        let err = gw.chat("conv_t", "A", None).await.unwrap_err();
        assert!(matches!(err, ChatError::BackendTimeout(d) if d == Duration::from_millis(50)));

        let log = gw.history("conv_t").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].content, "A");

        let reply = gw.chat("conv_t", "B", None).await.unwrap();
        assert_eq!(reply.sequence, 3);

        let log = gw.history("conv_t").await.unwrap();
        let contents: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["A", "B", "Took you long enough."]);
        assert_eq!(log[1].sequence, 2);

        // The unanswered message is still part of the context.
        let request = provider.last_request();
        assert_eq!(request.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_backend_error_is_distinguishable() {
        let provider = ScriptedProvider::default();
        provider.push(Step::Fail);
        let gw = gateway(&provider);

        let err = gw.chat("conv_f", "hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::BackendFailure(_)));
        assert!(err.is_backend());
        assert_eq!(gw.history("conv_f").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_a_backend_failure() {
        let provider = ScriptedProvider::default();
        provider.push(Step::Reply("   "));
        let gw = gateway(&provider);

        let err = gw.chat("conv_e", "hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::BackendFailure(_)));

        let log = gw.history("conv_e").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_scenario_binding_persists_until_reset() {
        let provider = ScriptedProvider::default();
        let gw = gateway(&provider);

        let reply = gw.chat("conv_s", "What was taken?", Some("heist")).await.unwrap();
        assert_eq!(reply.scenario, "heist");
        assert!(provider.last_request().messages[0].content.contains("Cartwright Diamond"));

        let reply = gw.chat("conv_s", "Any suspects?", None).await.unwrap();
        assert_eq!(reply.scenario, "heist");
        assert!(provider.last_request().messages[0].content.contains("Cartwright Diamond"));

        let reply = gw.chat("conv_s", "New case.", Some("murder")).await.unwrap();
        assert_eq!(reply.scenario, "murder");

        gw.reset("conv_s").await.unwrap();
        assert!(gw.history("conv_s").await.unwrap().is_empty());

        let reply = gw.chat("conv_s", "Start over.", None).await.unwrap();
        assert_eq!(reply.scenario, "freeform");
        assert_eq!(reply.sequence, 2);
    }

    #[tokio::test]
    async fn test_unknown_scenario_uses_default_instruction() {
        let provider = ScriptedProvider::default();
        let gw = gateway(&provider);

        let reply = gw.chat("conv_u", "hello", Some("no-such-case")).await.unwrap();
        assert_eq!(reply.scenario, "freeform");
        assert!(provider.last_request().messages[0].content.contains("THE CASE: None yet"));
    }

    #[tokio::test]
    async fn test_narration_occupies_sequence_and_reaches_context() {
        let provider = ScriptedProvider::default();
        let gw = gateway(&provider);

        gw.chat("conv_n", "Evening.", None).await.unwrap();
        let entry = gw.narrate("conv_n", "The lights go out.").await.unwrap();
        assert_eq!(entry.sequence, 3);
        assert_eq!(entry.role, ChatRole::Narration);

        gw.chat("conv_n", "Who did that?", None).await.unwrap();
        let request = provider.last_request();
        let narration = &request.messages[3];
        assert_eq!(narration.role, MessageRole::System);
        assert_eq!(narration.content, "The lights go out.");
        assert_eq!(request.messages[4].content, "Who did that?");

        assert!(matches!(gw.narrate("conv_n", " ").await, Err(ChatError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_context_window_bounds_request() {
        let provider = ScriptedProvider::default();
        let gw = gateway_with(
            &provider,
            GatewaySettings {
                context_window: 4,
                ..GatewaySettings::default()
            },
        );

        for i in 0..5 {
            gw.chat("conv_w", &format!("q{i}"), None).await.unwrap();
        }

        let request = provider.last_request();
        assert_eq!(request.messages.len(), 5);
        assert_eq!(request.messages[4].content, "q4");
        assert_eq!(gw.history("conv_w").await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_scenarios_and_stats() {
        let provider = ScriptedProvider::default();
        let gw = gateway(&provider);

        assert_eq!(gw.scenarios().len(), 6);
        assert_eq!(gw.provider_name(), "scripted");

        gw.chat("conv_a", "one", None).await.unwrap();
        gw.narrate("conv_b", "two").await.unwrap();

        let stats = gw.stats().await.unwrap();
        assert_eq!(stats.conversations, 2);
        assert_eq!(stats.messages, 3);
    }
}
