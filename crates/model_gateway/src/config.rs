//! Backend configuration.

use secrecy::SecretString;
use std::time::Duration;

use warden_core::config::{ModelApi, ModelSettings};

/// Settings shared by every backend variant.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api: ModelApi,
    /// Model identifier sent with each request.
    pub model: String,
    pub api_key: Option<SecretString>,
    /// Base URL; each variant appends its own path.
    pub endpoint: Option<String>,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl From<&ModelSettings> for BackendConfig {
    fn from(settings: &ModelSettings) -> Self {
        Self {
            api: settings.api,
            model: settings.name.clone(),
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.clone(),
            max_tokens: settings.max_tokens,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

impl BackendConfig {
    /// Config for the given API with defaults for everything else.
    pub fn new(api: ModelApi, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api,
            ..Self::from(&ModelSettings::default())
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(key.into()));
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}
