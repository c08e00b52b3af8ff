#![deny(unused)]
//! Observability for Warden.
//!
//! This crate provides:
//! - Tracing subscriber setup (human or JSON, stderr)
//! - Prometheus metrics recorder and metric helpers

pub mod metrics;
pub mod tracing_layer;

pub use metrics::{setup_metrics_recorder, track_execution, track_tokens, track_tool_call};
pub use tracing_layer::configure_tracing;
