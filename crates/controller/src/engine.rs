//! Conversation engine.
//!
//! Drives one chat session against a model backend. When the model asks for
//! tools, each `tool_use` block is run in order and the results are folded
//! back into history as a single user message before the model is called
//! again.

use serde_json::{json, Value};
use std::sync::Arc;

use warden_core::{
    config::ConversationSettings,
    traits::{CodeExecutor, ModelBackend},
    types::{ContentBlock, Message, StopReason, TokenUsage, ToolCapabilityDescriptor},
    Error, Result,
};
use warden_skills::ToolRegistry;

use crate::prompt::{CODE_PARAM_DESCRIPTION, DEFAULT_SYSTEM_PROMPT, EXECUTE_CODE_PREAMBLE};
use crate::truncate::truncate_chars;

/// Name of the single capability offered to the model.
pub const EXECUTE_CODE_TOOL: &str = "execute_code";

/// Engine limits.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model calls allowed per `chat` call.
    pub max_iterations: usize,
    /// Character cap for each stringified tool result.
    pub tool_result_max_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&ConversationSettings::default())
    }
}

impl From<&ConversationSettings> for EngineConfig {
    fn from(settings: &ConversationSettings) -> Self {
        Self {
            max_iterations: settings.max_iterations,
            tool_result_max_chars: settings.tool_result_max_chars,
        }
    }
}

/// One chat session.
///
/// History is append-only while `chat` runs and is only ever changed by the
/// engine itself. Independent sessions share the backend, registry and
/// executor but nothing else.
pub struct ConversationEngine {
    backend: Arc<dyn ModelBackend>,
    registry: Arc<ToolRegistry>,
    executor: Arc<dyn CodeExecutor>,
    system_prompt: String,
    config: EngineConfig,
    history: Vec<Message>,
    usage: TokenUsage,
}

impl ConversationEngine {
    pub fn builder() -> ConversationEngineBuilder {
        ConversationEngineBuilder::new()
    }

    /// Send a user message and run the model until it ends its turn.
    ///
    /// Returns the concatenated text of the final assistant message. Backend
    /// failures propagate; tool failures are handed to the model as data.
    pub async fn chat(&mut self, user_message: &str) -> Result<String> {
        self.history.push(Message::user(user_message));
        let tools = [self.tool_capability_descriptor()];

        for iteration in 1..=self.config.max_iterations {
            let response = self
                .backend
                .complete(&self.history, Some(self.system_prompt.as_str()), &tools)
                .await?;

            self.usage.add(response.usage);
            warden_governance::track_tokens(
                self.backend.name(),
                response.usage.input_tokens,
                response.usage.output_tokens,
            );

            let text = response.text();
            let tool_uses: Vec<_> = response
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => Some((id.clone(), name.clone(), input.clone())),
                    _ => None,
                })
                .collect();
            self.history.push(Message::assistant(response.content));

            if response.stop_reason == StopReason::EndTurn {
                tracing::info!(iteration, "Model ended its turn");
                return Ok(text);
            }
            if tool_uses.is_empty() {
                tracing::warn!(iteration, "Model asked for tools without any tool_use block");
                return Ok(text);
            }

            tracing::info!(iteration, tool_uses = tool_uses.len(), "Dispatching tool uses");
            let mut results = Vec::with_capacity(tool_uses.len());
            for (id, name, input) in tool_uses {
                let content = self.run_tool(&name, &input).await;
                results.push(ContentBlock::tool_result(id, content));
            }
            self.history.push(Message::tool_results(results));
        }

        tracing::warn!(max = self.config.max_iterations, "Conversation hit the iteration limit");
        Err(Error::MaxIterationsExceeded(self.config.max_iterations))
    }

    /// The `execute_code` capability, with the registry's documentation
    /// embedded in its description.
    pub fn tool_capability_descriptor(&self) -> ToolCapabilityDescriptor {
        ToolCapabilityDescriptor {
            name: EXECUTE_CODE_TOOL.to_string(),
            description: format!(
                "{}\n{}",
                EXECUTE_CODE_PREAMBLE,
                self.registry.generate_documentation()
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "code": {
                        "type": "string",
                        "description": CODE_PARAM_DESCRIPTION,
                    }
                },
                "required": ["code"],
            }),
        }
    }

    /// Run one tool use and render its result for the model.
    async fn run_tool(&self, name: &str, input: &Value) -> String {
        let result = if name == EXECUTE_CODE_TOOL {
            let code = input.get("code").and_then(Value::as_str).unwrap_or_default();
            let result = self.executor.execute(code).await;
            tracing::debug!(success = result.success, outcome = result.outcome.as_str(), "Code executed");
            serde_json::to_string(&result)
        } else {
            tracing::warn!(tool = %name, "Model used an unknown tool");
            serde_json::to_string(&json!({ "error": format!("Unknown tool: {}", name) }))
        };

        let text = result.unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string());
        truncate_chars(&text, self.config.tool_result_max_chars).into_owned()
    }

    /// Messages exchanged so far.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Tokens reported by the backend since the session started.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Start a new session, keeping backend, tools and configuration.
    pub fn reset(&mut self) {
        self.history.clear();
        self.usage = TokenUsage::default();
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`ConversationEngine`].
#[derive(Default)]
pub struct ConversationEngineBuilder {
    config: EngineConfig,
    backend: Option<Arc<dyn ModelBackend>>,
    registry: Option<Arc<ToolRegistry>>,
    executor: Option<Arc<dyn CodeExecutor>>,
    system_prompt: Option<String>,
}

impl ConversationEngineBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model backend.
    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the tool registry whose documentation the model sees.
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the executor behind `execute_code`.
    pub fn with_executor(mut self, executor: Arc<dyn CodeExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Override the built-in system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn build(self) -> Result<ConversationEngine> {
        let backend = self
            .backend
            .ok_or_else(|| Error::config("ConversationEngine requires a model backend"))?;
        let registry = self
            .registry
            .ok_or_else(|| Error::config("ConversationEngine requires a tool registry"))?;
        let executor = self
            .executor
            .ok_or_else(|| Error::config("ConversationEngine requires a code executor"))?;

        Ok(ConversationEngine {
            backend,
            registry,
            executor,
            system_prompt: self
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            config: self.config,
            history: Vec::new(),
            usage: TokenUsage::default(),
        })
    }
}
