//! Line protocol spoken between the bridge and a worker.
//!
//! Every frame is one JSON object on its own line. Worker frames are
//! classified by the keys they carry:
//!
//! ```text
//! {"tool_call": true, "tool": "ns.action", "params": {...}}   worker -> bridge
//! {"output": <value>}                                          worker -> bridge
//! {"debug": "text"}                                            worker -> bridge
//! {"tool_result": <value>}                                     bridge -> worker
//! {"tool_error": "message"}                                    bridge -> worker
//! ```
//!
//! Anything else the worker prints is kept as plain debug text.

use serde::Serialize;
use serde_json::Value;

use warden_core::Result;

// =============================================================================
// Worker -> Bridge
// =============================================================================

/// One line received from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerFrame {
    /// Request to run a registered tool. The worker blocks until answered.
    ToolCall { tool: String, params: Value },
    /// A result value produced by the program.
    Output(Value),
    /// Diagnostic text, including lines that are not protocol frames.
    Debug(String),
    /// A `tool_call` frame that cannot be dispatched. Still needs an answer.
    MalformedCall { line: String, reason: String },
}

impl WorkerFrame {
    /// Classify one line of worker output. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if line.trim().is_empty() {
            return None;
        }

        let Ok(Value::Object(mut frame)) = serde_json::from_str::<Value>(line) else {
            return Some(WorkerFrame::Debug(line.to_string()));
        };

        if frame.contains_key("tool_call") {
            return Some(match frame.remove("tool") {
                Some(Value::String(tool)) => WorkerFrame::ToolCall {
                    tool,
                    params: frame.remove("params").unwrap_or(Value::Null),
                },
                Some(_) => WorkerFrame::MalformedCall {
                    line: line.to_string(),
                    reason: "tool name must be a string".into(),
                },
                None => WorkerFrame::MalformedCall {
                    line: line.to_string(),
                    reason: "missing tool name".into(),
                },
            });
        }

        if let Some(value) = frame.remove("output") {
            return Some(WorkerFrame::Output(value));
        }

        match frame.remove("debug") {
            Some(Value::String(text)) => Some(WorkerFrame::Debug(text)),
            Some(other) => Some(WorkerFrame::Debug(other.to_string())),
            None => Some(WorkerFrame::Debug(line.to_string())),
        }
    }
}

// =============================================================================
// Bridge -> Worker
// =============================================================================

/// Reply to a `tool_call`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeFrame {
    ToolResult(Value),
    ToolError(String),
}

impl BridgeFrame {
    /// Encode as one newline-terminated line.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
