//! The closed set of model backends.

use async_trait::async_trait;

use warden_core::{
    config::ModelApi,
    traits::ModelBackend,
    types::{CanonicalResponse, Message, ToolCapabilityDescriptor},
    Result,
};

use crate::anthropic::AnthropicBackend;
use crate::config::BackendConfig;
use crate::openai::OpenAiBackend;

/// One of the supported provider APIs.
pub enum ProviderBackend {
    Anthropic(AnthropicBackend),
    /// OpenAI itself, or any OpenAI-compatible endpoint.
    OpenAi(OpenAiBackend),
}

impl ProviderBackend {
    /// Build the variant selected by `config.api`.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let backend = match config.api {
            ModelApi::Anthropic => Self::Anthropic(AnthropicBackend::new(config)?),
            ModelApi::OpenAi | ModelApi::OpenApi => Self::OpenAi(OpenAiBackend::new(config)?),
        };
        tracing::info!(provider = backend.name(), model = %config.model, "Model backend ready");
        Ok(backend)
    }
}

#[async_trait]
impl ModelBackend for ProviderBackend {
    fn name(&self) -> &str {
        match self {
            Self::Anthropic(backend) => backend.name(),
            Self::OpenAi(backend) => backend.name(),
        }
    }

    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolCapabilityDescriptor],
    ) -> Result<CanonicalResponse> {
        match self {
            Self::Anthropic(backend) => backend.complete(history, system, tools).await,
            Self::OpenAi(backend) => backend.complete(history, system, tools).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_follows_api() {
        let anthropic = BackendConfig::new(ModelApi::Anthropic, "claude").with_api_key("k");
        assert!(matches!(
            ProviderBackend::from_config(&anthropic).unwrap(),
            ProviderBackend::Anthropic(_)
        ));

        let openai = BackendConfig::new(ModelApi::OpenAi, "gpt").with_api_key("k");
        let backend = ProviderBackend::from_config(&openai).unwrap();
        assert_eq!(backend.name(), "openai");

        let compatible =
            BackendConfig::new(ModelApi::OpenApi, "local").with_endpoint("http://127.0.0.1:9");
        let backend = ProviderBackend::from_config(&compatible).unwrap();
        assert!(matches!(backend, ProviderBackend::OpenAi(_)));
        assert_eq!(backend.name(), "openapi");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_backend_error() {
        let config =
            BackendConfig::new(ModelApi::OpenApi, "local").with_endpoint("http://127.0.0.1:9");
        let backend = ProviderBackend::from_config(&config).unwrap();

        let err = backend
            .complete(&[Message::user("hi")], None, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, warden_core::Error::Backend(_)));
    }
}
