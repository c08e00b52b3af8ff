#![deny(unused)]
//! Model backends for Warden.
//!
//! This crate provides:
//! - Anthropic Messages API backend
//! - OpenAI chat completions backend (also for OpenAI-compatible endpoints)
//! - Translation between each wire format and the canonical conversation model

pub mod anthropic;
pub mod config;
mod http;
pub mod openai;
pub mod providers;

pub use anthropic::AnthropicBackend;
pub use config::BackendConfig;
pub use openai::OpenAiBackend;
pub use providers::ProviderBackend;

use warden_core::config::ModelSettings;

/// Create the configured model backend.
pub fn create_backend_from_config(settings: &ModelSettings) -> warden_core::Result<ProviderBackend> {
    ProviderBackend::from_config(&BackendConfig::from(settings))
}
