//! Error types for Warden.

use thiserror::Error;

/// Result type alias using Warden's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Named execution quota that can be breached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    /// Size of the submitted source text, in bytes.
    SourceSize,
    /// Number of tool calls issued by one worker.
    ToolCalls,
    /// Cumulative bytes observed on the worker's output stream.
    OutputBytes,
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quota::SourceSize => write!(f, "source size"),
            Quota::ToolCalls => write!(f, "tool call count"),
            Quota::OutputBytes => write!(f, "output bytes"),
        }
    }
}

/// Core error type for Warden.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Tool Registry Errors
    // =========================================================================
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("{0} not configured")]
    ServiceUnavailable(String),

    // =========================================================================
    // Execution Bridge Errors
    // =========================================================================
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Quota exceeded: {quota} limit of {limit}")]
    QuotaExceeded { quota: Quota, limit: u64 },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Worker fault: {0}")]
    WorkerFault(String),

    // =========================================================================
    // Conversation Engine Errors
    // =========================================================================
    #[error("Model backend error: {0}")]
    Backend(String),

    #[error("Conversation exceeded max iterations: {0}")]
    MaxIterationsExceeded(usize),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an unknown tool error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a tool execution error.
    pub fn tool_execution(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a service unavailable error.
    pub fn service_unavailable(service: impl Into<String>) -> Self {
        Self::ServiceUnavailable(service.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a worker fault error.
    pub fn worker_fault(msg: impl Into<String>) -> Self {
        Self::WorkerFault(msg.into())
    }

    /// Create a model backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error was raised before any handler ran.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::Validation(_))
    }
}
