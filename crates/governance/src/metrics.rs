//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use warden_core::{types::ExecutionOutcome, Error, Result};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Track one finished execution by outcome.
pub fn track_execution(runtime: &str, outcome: ExecutionOutcome, elapsed: Duration) {
    metrics::counter!(
        "warden_executions_total",
        "runtime" => runtime.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    metrics::histogram!("warden_execution_duration_seconds", "runtime" => runtime.to_string())
        .record(elapsed.as_secs_f64());
}

/// Track one tool dispatch from a worker.
pub fn track_tool_call(tool: &str, ok: bool) {
    metrics::counter!(
        "warden_tool_calls_total",
        "tool" => tool.to_string(),
        "status" => if ok { "ok" } else { "error" }
    )
    .increment(1);
}

/// Helper to track token usage.
pub fn track_tokens(model: &str, input: u64, output: u64) {
    metrics::counter!("llm_token_usage_total", "model" => model.to_string(), "type" => "input").increment(input);
    metrics::counter!("llm_token_usage_total", "model" => model.to_string(), "type" => "output").increment(output);
}
