use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

// =============================================================================
// Execution Types
// =============================================================================

/// Terminal state of one execution request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Worker exited on its own and nothing went wrong.
    #[default]
    Completed,
    /// Worker exited non-zero, wrote to stderr, or broke the protocol.
    Failed,
    /// A per-read timeout or the overall deadline was breached.
    TimedOut,
    /// A size, tool call, or output ceiling was breached.
    QuotaExceeded,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Completed => "completed",
            ExecutionOutcome::Failed => "failed",
            ExecutionOutcome::TimedOut => "timed_out",
            ExecutionOutcome::QuotaExceeded => "quota_exceeded",
        }
    }
}

/// Structured result of running one program in a worker.
///
/// Serialises to `{success, output?, debug, error?}`, which is the shape
/// returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// One `output` frame yields a scalar, several yield an ordered list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub debug: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub outcome: ExecutionOutcome,
    #[serde(skip)]
    pub tool_calls: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ExecutionResult {
    /// A result for a request that never reached a worker.
    pub fn rejected(outcome: ExecutionOutcome, error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: None,
            debug: Vec::new(),
            error: Some(error.into()),
            outcome,
            tool_calls: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Fold the ordered `output` frames into the result value.
    pub fn fold_outputs(mut outputs: Vec<Value>) -> Option<Value> {
        match outputs.len() {
            0 => None,
            1 => outputs.pop(),
            _ => Some(Value::Array(outputs)),
        }
    }
}
