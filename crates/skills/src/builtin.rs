//! Built-in tools.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use warden_core::{
    traits::ToolHandler,
    types::{ParamKind, ToolContext, ToolParameter},
    Error, Result,
};

use crate::registry::{ToolDefinition, ToolRegistry};

// =============================================================================
// Echo Tool
// =============================================================================

/// Returns its input unchanged. Useful for checking the worker round trip.
pub struct EchoTool;

impl EchoTool {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "util.echo",
            "Return the given value unchanged",
            Arc::new(EchoTool),
        )
        .with_parameter(ToolParameter::required(
            "value",
            ParamKind::String,
            "The value to echo back",
        ))
    }
}

#[async_trait]
impl ToolHandler for EchoTool {
    async fn handle(&self, _ctx: &ToolContext, params: Map<String, Value>) -> Result<Value> {
        Ok(params.get("value").cloned().unwrap_or(Value::Null))
    }
}

// =============================================================================
// Data Store Query Tool
// =============================================================================

/// Runs a read-only SQL query against the configured data store.
pub struct DataStoreQueryTool;

impl DataStoreQueryTool {
    pub fn definition() -> ToolDefinition {
        ToolDefinition::new(
            "datastore.query",
            "Execute a read-only SQL query against the event data store and return the rows",
            Arc::new(DataStoreQueryTool),
        )
        .with_parameter(ToolParameter::required(
            "sql",
            ParamKind::String,
            "The SQL query to execute",
        ))
    }
}

#[async_trait]
impl ToolHandler for DataStoreQueryTool {
    async fn handle(&self, ctx: &ToolContext, params: Map<String, Value>) -> Result<Value> {
        let sql = params
            .get("sql")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::validation("sql is required"))?;

        let rows = ctx.data_store()?.query(sql).await?;
        tracing::debug!(rows = rows.len(), "Data store query completed");

        Ok(json!({ "rows": rows, "count": rows.len() }))
    }
}

/// Register every built-in tool.
pub fn register_builtin_tools(registry: &ToolRegistry) -> Result<()> {
    registry.register(EchoTool::definition())?;
    registry.register(DataStoreQueryTool::definition())?;
    Ok(())
}
