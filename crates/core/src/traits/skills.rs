//! Tool and execution traits.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::{ExecutionResult, ToolContext};

/// Handler behind a registered tool.
///
/// Handlers are pure functions of `(context, params)`; they hold no mutable
/// state shared between calls.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with validated parameters.
    async fn handle(&self, ctx: &ToolContext, params: Map<String, Value>) -> Result<Value>;
}

/// Runs model-written programs.
///
/// Never fails at the boundary: every internal failure is reported inside the
/// returned [`ExecutionResult`].
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, source: &str) -> ExecutionResult;
}
