//! OpenAI chat completions backend.
//!
//! Also serves OpenAI-compatible endpoints (`openapi`), where the API key is
//! optional.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_core::{
    config::ModelApi,
    traits::ModelBackend,
    types::{CanonicalResponse, ContentBlock, Message, Role, StopReason, TokenUsage, ToolCapabilityDescriptor},
    Error, Result,
};

use crate::config::BackendConfig;
use crate::http::HttpClientBase;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Client for `POST /v1/chat/completions`.
pub struct OpenAiBackend {
    base: HttpClientBase,
    api_key: Option<SecretString>,
    model: String,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let (id, endpoint) = match config.api {
            ModelApi::OpenApi => {
                let endpoint = config
                    .endpoint
                    .clone()
                    .ok_or_else(|| Error::config("model.endpoint is required for the openapi API"))?;
                ("openapi", endpoint)
            }
            _ => {
                if config.api_key.is_none() {
                    return Err(Error::config("model.api_key is required for the openai API"));
                }
                let endpoint = config.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
                ("openai", endpoint)
            }
        };

        Ok(Self {
            base: HttpClientBase::new(id, endpoint, config.request_timeout)?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                .map_err(|_| Error::config("model.api_key contains characters not allowed in a header"))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    fn name(&self) -> &str {
        self.base.id
    }

    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolCapabilityDescriptor],
    ) -> Result<CanonicalResponse> {
        let request = build_request(&self.model, self.max_tokens, history, system, tools);

        tracing::info!(
            provider = self.base.id,
            model = %self.model,
            messages = request.messages.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: CompletionResponse = self
            .base
            .post_json(COMPLETIONS_PATH, self.headers()?, &request)
            .await?;
        let canonical = into_canonical(response)?;

        tracing::debug!(
            stop_reason = ?canonical.stop_reason,
            blocks = canonical.content.len(),
            "Received response from OpenAI-compatible provider"
        );
        Ok(canonical)
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ChatTool<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn new(role: &'static str, content: Option<String>) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: FunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON-encoded argument object.
    arguments: String,
}

#[derive(Debug, Serialize)]
struct ChatTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionSpec<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ChatToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn function_type() -> String {
    "function".to_string()
}

fn joined_text(blocks: &[ContentBlock]) -> Option<String> {
    let text: Vec<&str> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    (!text.is_empty()).then(|| text.join("\n"))
}

fn build_request<'a>(
    model: &'a str,
    max_tokens: u32,
    history: &[Message],
    system: Option<&str>,
    tools: &'a [ToolCapabilityDescriptor],
) -> CompletionRequest<'a> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if let Some(system) = system {
        messages.push(ChatMessage::new("system", Some(system.to_string())));
    }

    for message in history {
        match message.role {
            Role::User => {
                // Tool results must directly follow the assistant turn that asked for them.
                for block in &message.content {
                    if let ContentBlock::ToolResult { tool_use_id, content } = block {
                        messages.push(ChatMessage {
                            tool_call_id: Some(tool_use_id.clone()),
                            ..ChatMessage::new("tool", Some(content.clone()))
                        });
                    }
                }
                if let Some(text) = joined_text(&message.content) {
                    messages.push(ChatMessage::new("user", Some(text)));
                }
            }
            Role::Assistant => {
                let tool_calls = message
                    .content
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::ToolUse { id, name, input } => Some(ChatToolCall {
                            id: id.clone(),
                            kind: function_type(),
                            function: FunctionCall {
                                name: name.clone(),
                                arguments: input.to_string(),
                            },
                        }),
                        _ => None,
                    })
                    .collect();
                messages.push(ChatMessage {
                    tool_calls,
                    ..ChatMessage::new("assistant", joined_text(&message.content))
                });
            }
        }
    }

    let tools = tools
        .iter()
        .map(|tool| ChatTool {
            kind: "function",
            function: FunctionSpec {
                name: &tool.name,
                description: &tool.description,
                parameters: &tool.input_schema,
            },
        })
        .collect();

    CompletionRequest {
        model,
        max_tokens,
        messages,
        tools,
    }
}

fn into_canonical(response: CompletionResponse) -> Result<CanonicalResponse> {
    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::backend("response contained no choices"))?;

    let mut content = Vec::new();
    if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text { text });
    }

    let has_tool_calls = !choice.message.tool_calls.is_empty();
    for call in choice.message.tool_calls {
        let input: Value = serde_json::from_str(&call.function.arguments).map_err(|e| {
            Error::backend(format!(
                "tool call {} carried invalid JSON arguments: {}",
                call.id, e
            ))
        })?;
        content.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }

    let stop_reason = match choice.finish_reason.as_deref() {
        Some("tool_calls") => StopReason::ToolUse,
        _ if has_tool_calls => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    };

    Ok(CanonicalResponse {
        content,
        stop_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let history = vec![
            Message::user("hello"),
            Message::assistant(vec![ContentBlock::tool_use(
                "call_1",
                "execute_code",
                json!({"code": "output(1)"}),
            )]),
            Message::tool_results(vec![ContentBlock::tool_result("call_1", "{\"success\":true}")]),
        ];
        let tools = vec![ToolCapabilityDescriptor {
            name: "execute_code".into(),
            description: "Run code".into(),
            input_schema: json!({"type": "object"}),
        }];

        let request = build_request("gpt-test", 500, &history, Some("be brief"), &tools);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-test",
                "max_tokens": 500,
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": null, "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "execute_code", "arguments": "{\"code\":\"output(1)\"}"}
                    }]},
                    {"role": "tool", "content": "{\"success\":true}", "tool_call_id": "call_1"}
                ],
                "tools": [{
                    "type": "function",
                    "function": {"name": "execute_code", "description": "Run code", "parameters": {"type": "object"}}
                }]
            })
        );
    }

    #[test]
    fn test_tool_call_arguments_are_parsed() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "id": "call_7",
                        "type": "function",
                        "function": {"name": "execute_code", "arguments": "{\"code\": \"output(2)\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 30, "completion_tokens": 4, "total_tokens": 34}
        }))
        .unwrap();

        let canonical = into_canonical(response).unwrap();

        assert_eq!(canonical.stop_reason, StopReason::ToolUse);
        assert_eq!(
            canonical.content,
            vec![ContentBlock::tool_use("call_7", "execute_code", json!({"code": "output(2)"}))]
        );
        assert_eq!(canonical.usage.input_tokens, 30);
        assert_eq!(canonical.usage.output_tokens, 4);
    }

    #[test]
    fn test_text_reply_ends_turn() {
        let response: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "hi there"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        let canonical = into_canonical(response).unwrap();
        assert_eq!(canonical.stop_reason, StopReason::EndTurn);
        assert_eq!(canonical.text(), "hi there");
    }

    #[test]
    fn test_invalid_arguments_and_empty_choices_are_backend_errors() {
        let bad_args: CompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null, "tool_calls": [{
                "id": "call_1",
                "function": {"name": "execute_code", "arguments": "{not json"}
            }]}, "finish_reason": "tool_calls"}]
        }))
        .unwrap();
        assert!(matches!(into_canonical(bad_args), Err(Error::Backend(_))));

        let empty: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(into_canonical(empty), Err(Error::Backend(_))));
    }

    #[test]
    fn test_openapi_needs_endpoint_but_not_key() {
        let config = BackendConfig::new(ModelApi::OpenApi, "local-model");
        assert!(matches!(OpenAiBackend::new(&config), Err(Error::Config(_))));

        let config = config.with_endpoint("http://localhost:8000");
        let backend = OpenAiBackend::new(&config).unwrap();
        assert_eq!(backend.name(), "openapi");
        assert!(backend.headers().unwrap().is_empty());
    }
}
