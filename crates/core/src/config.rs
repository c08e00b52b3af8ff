use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub sandbox: SandboxSettings,
    pub model: ModelSettings,
    pub conversation: ConversationSettings,
    pub logging: LoggingSettings,
    pub services: ServiceSettings,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SandboxSettings {
    /// Worker runtime executable.
    pub runtime_program: String,
    /// Directory holding the generated bindings; the only path the worker may read.
    pub bindings_dir: String,
    pub max_source_bytes: usize,
    pub max_tool_calls: usize,
    pub max_output_bytes: usize,
    pub read_timeout_secs: u64,
    pub deadline_secs: u64,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            runtime_program: "deno".into(),
            bindings_dir: "./sandbox".into(),
            max_source_bytes: 100_000,
            max_tool_calls: 50,
            max_output_bytes: 1024 * 1024,
            read_timeout_secs: 30,
            deadline_secs: 120,
        }
    }
}

/// Supported model provider APIs.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelApi {
    #[default]
    Anthropic,
    OpenAi,
    /// OpenAI-compatible API served from `model.endpoint`.
    OpenApi,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelSettings {
    pub api: ModelApi,
    pub name: String,
    pub api_key: Option<SecretString>,
    pub endpoint: Option<String>,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api: ModelApi::Anthropic,
            name: "claude-sonnet-4-5-20250929".into(),
            api_key: None,
            endpoint: None,
            max_tokens: 25_000,
            request_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConversationSettings {
    pub max_iterations: usize,
    /// Character cap applied to each stringified tool result.
    pub tool_result_max_chars: usize,
    /// Overrides the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            tool_result_max_chars: 20_000,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingSettings {
    pub json: bool,
}

/// Endpoints of the external collaborators reached by tools.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ServiceSettings {
    pub data_store_url: Option<String>,
    pub lookup_url: Option<String>,
    pub moderation_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("WARDEN_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map WARDEN__MODEL__NAME=... to model.name
            .add_source(Environment::with_prefix("WARDEN").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
