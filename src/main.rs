#![deny(unused)]
//! Warden - interactive agent with a sandboxed code execution tool.
//!
//! Wires the tool registry, the execution bridge, the configured model backend
//! and the conversation engine together, then chats over stdin/stdout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use warden_controller::{ConversationEngine, EngineConfig};
use warden_core::config::AppConfig;
use warden_core::traits::{CodeExecutor, ModelBackend};
use warden_core::types::ToolContext;
use warden_sandbox::{BridgeConfig, DenoRuntime, ExecutionBridge};
use warden_skills::{register_builtin_tools, ToolRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    warden_governance::configure_tracing(config.logging.json)?;
    let _metrics = warden_governance::setup_metrics_recorder()?;

    tracing::info!("Starting Warden v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Tools
    // =========================================================================
    let registry = Arc::new(ToolRegistry::new());
    register_builtin_tools(&registry)?;

    let services = &config.services;
    for (service, endpoint) in [
        ("data_store", &services.data_store_url),
        ("lookup", &services.lookup_url),
        ("moderation", &services.moderation_url),
    ] {
        if let Some(endpoint) = endpoint {
            tracing::warn!(
                service,
                endpoint = %endpoint,
                "No client for this service in this build; tools using it will report it unavailable"
            );
        }
    }
    let context = ToolContext::new();

    tracing::info!(tools = registry.len(), "Tool registry initialized");

    // =========================================================================
    // Execution bridge
    // =========================================================================
    let runtime = Arc::new(DenoRuntime::new(config.sandbox.runtime_program.clone()));
    let bridge_config = BridgeConfig::from(&config.sandbox);
    tracing::info!(
        runtime = %config.sandbox.runtime_program,
        bindings_dir = %bridge_config.bindings_dir.display(),
        "Execution bridge initialized"
    );
    let executor: Arc<dyn CodeExecutor> = Arc::new(ExecutionBridge::new(
        registry.clone(),
        context,
        runtime,
        bridge_config,
    ));

    // =========================================================================
    // Model backend and engine
    // =========================================================================
    let backend: Arc<dyn ModelBackend> =
        Arc::new(warden_model_gateway::create_backend_from_config(&config.model)?);
    tracing::info!(
        backend = backend.name(),
        model = %config.model.name,
        "Model backend initialized"
    );

    let mut builder = ConversationEngine::builder()
        .with_config(EngineConfig::from(&config.conversation))
        .with_backend(backend)
        .with_registry(registry)
        .with_executor(executor);
    if let Some(prompt) = &config.conversation.system_prompt {
        builder = builder.with_system_prompt(prompt.clone());
    }
    let mut engine = builder.build()?;

    tracing::info!("Services initialized. Starting interactive chat.");
    println!("\nAgent ready. Type your message (Ctrl+D to exit).\n");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"You: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        tracing::info!(chars = input.chars().count(), "User message");
        match engine.chat(input).await {
            Ok(response) => println!("\nAgent: {}\n", response),
            Err(e) => {
                tracing::error!(error = %e, "Conversation turn failed");
                println!("\nAgent error: {}\n", e);
            }
        }
    }

    let usage = engine.usage();
    tracing::info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        "Exiting"
    );
    Ok(())
}
