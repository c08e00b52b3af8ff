//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use warden_core::{
    traits::ModelBackend,
    types::{CanonicalResponse, ContentBlock, Message, Role, StopReason, TokenUsage, ToolCapabilityDescriptor},
    Error, Result,
};

use crate::config::BackendConfig;
use crate::http::HttpClientBase;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Client for `POST /v1/messages`.
pub struct AnthropicBackend {
    base: HttpClientBase,
    api_key: SecretString,
    model: String,
    max_tokens: u32,
}

impl AnthropicBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::config("model.api_key is required for the anthropic API"))?;
        let endpoint = config.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self {
            base: HttpClientBase::new("anthropic", endpoint, config.request_timeout)?,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(self.api_key.expose_secret())
            .map_err(|_| Error::config("model.api_key contains characters not allowed in a header"))?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolCapabilityDescriptor],
    ) -> Result<CanonicalResponse> {
        let request = build_request(&self.model, self.max_tokens, history, system, tools);

        tracing::info!(
            model = %self.model,
            messages = history.len(),
            "Sending request to Anthropic"
        );

        let response: MessagesResponse = self
            .base
            .post_json(MESSAGES_PATH, self.headers()?, &request)
            .await?;
        let canonical = into_canonical(response);

        tracing::debug!(
            stop_reason = ?canonical.stop_reason,
            blocks = canonical.content.len(),
            "Received response from Anthropic"
        );
        Ok(canonical)
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Vec<RequestBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RequestBlock<'a> {
    Text { text: &'a str },
    ToolUse { id: &'a str, name: &'a str, input: &'a Value },
    ToolResult { tool_use_id: &'a str, content: &'a str },
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn build_request<'a>(
    model: &'a str,
    max_tokens: u32,
    history: &'a [Message],
    system: Option<&'a str>,
    tools: &'a [ToolCapabilityDescriptor],
) -> MessagesRequest<'a> {
    let messages = history
        .iter()
        .map(|message| WireMessage {
            role: match message.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: message
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => RequestBlock::Text { text },
                    ContentBlock::ToolUse { id, name, input } => RequestBlock::ToolUse { id, name, input },
                    ContentBlock::ToolResult { tool_use_id, content } => {
                        RequestBlock::ToolResult { tool_use_id, content }
                    }
                })
                .collect(),
        })
        .collect();

    let tools = tools
        .iter()
        .map(|tool| WireTool {
            name: &tool.name,
            description: &tool.description,
            input_schema: &tool.input_schema,
        })
        .collect();

    MessagesRequest {
        model,
        max_tokens,
        system,
        messages,
        tools,
    }
}

fn into_canonical(response: MessagesResponse) -> CanonicalResponse {
    let content: Vec<ContentBlock> = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => Some(ContentBlock::ToolUse { id, name, input }),
            ResponseBlock::Other => None,
        })
        .collect();

    // Every tool_use block must be answered before the next request.
    let has_tool_use = content
        .iter()
        .any(|block| matches!(block, ContentBlock::ToolUse { .. }));
    let stop_reason = match response.stop_reason.as_deref() {
        Some("tool_use") => StopReason::ToolUse,
        _ if has_tool_use => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    };

    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        })
        .unwrap_or_default();

    CanonicalResponse {
        content,
        stop_reason,
        usage,
    }
}
