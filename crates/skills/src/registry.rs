//! Tool registry implementation.

use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use warden_core::{
    traits::ToolHandler,
    types::{ToolContext, ToolParameter},
    Error, Result,
};

/// A registered capability: schema plus handler.
#[derive(Clone)]
pub struct ToolDefinition {
    /// Namespaced name, e.g. `datastore.query`.
    pub name: String,
    pub description: String,
    /// Declared parameters, in declaration order.
    pub parameters: Vec<ToolParameter>,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    /// Create a definition without parameters.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            handler,
        }
    }

    /// Declare a parameter.
    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Substring before the first `.`.
    pub fn namespace(&self) -> &str {
        self.name.split_once('.').map_or(self.name.as_str(), |(ns, _)| ns)
    }

    /// Substring after the first `.`.
    pub fn action(&self) -> &str {
        self.name.split_once('.').map_or("", |(_, action)| action)
    }

    fn declares(&self, name: &str) -> bool {
        self.parameters.iter().any(|p| p.name == name)
    }

    fn validate_declaration(&self) -> Result<()> {
        let (namespace, action) = self.name.split_once('.').ok_or_else(|| {
            Error::validation(format!(
                "Tool name '{}' must have the form 'namespace.action'",
                self.name
            ))
        })?;
        if !is_identifier(namespace) || !is_identifier(action) {
            return Err(Error::validation(format!(
                "Tool name '{}' must be two identifiers joined by '.'",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for param in &self.parameters {
            if !is_identifier(&param.name) {
                return Err(Error::validation(format!(
                    "Tool '{}' declares invalid parameter name '{}'",
                    self.name, param.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(Error::validation(format!(
                    "Tool '{}' declares parameter '{}' twice",
                    self.name, param.name
                )));
            }
        }
        Ok(())
    }

    /// Apply the single-object unwrap convention.
    ///
    /// `{"params": {"x": 1}}` becomes `{"x": 1}` when every inner key is a
    /// declared parameter. A wrapper key that names a declared parameter
    /// whose kind already accepts the value is left alone.
    fn unwrap_params(&self, params: Map<String, Value>) -> Map<String, Value> {
        if params.len() != 1 {
            return params;
        }
        let unwrappable = params.iter().next().is_some_and(|(key, value)| {
            let binds_directly = self
                .parameters
                .iter()
                .any(|p| &p.name == key && p.kind.matches(value));
            !binds_directly
                && value
                    .as_object()
                    .is_some_and(|inner| inner.keys().all(|k| self.declares(k)))
        });
        if !unwrappable {
            return params;
        }
        match params.into_iter().next() {
            Some((_, Value::Object(inner))) => inner,
            Some((key, value)) => Map::from_iter([(key, value)]),
            None => Map::new(),
        }
    }

    /// Check parameters against the schema and fill declared defaults.
    fn bind_params(&self, mut params: Map<String, Value>) -> Result<Map<String, Value>> {
        if let Some(unknown) = params.keys().find(|k| !self.declares(k)) {
            return Err(Error::validation(format!(
                "Tool '{}' got unexpected parameter '{}'",
                self.name, unknown
            )));
        }

        for param in &self.parameters {
            match params.get(&param.name) {
                Some(Value::Null) if !param.required => {}
                Some(value) if !param.kind.matches(value) => {
                    return Err(Error::validation(format!(
                        "Parameter '{}' of tool '{}' must be {}",
                        param.name, self.name, param.kind
                    )));
                }
                Some(_) => {}
                None if param.required => {
                    return Err(Error::validation(format!(
                        "Tool '{}' is missing required parameter '{}'",
                        self.name, param.name
                    )));
                }
                None => {
                    if let Some(default) = &param.default {
                        params.insert(param.name.clone(), default.clone());
                    }
                }
            }
        }
        Ok(params)
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Catalog of invocable tools keyed by name.
///
/// Built once at startup and shared read-only afterwards; concurrent
/// dispatch is safe because handlers carry no shared mutable state.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Register a tool. Registering a name twice is rejected.
    pub fn register(&self, definition: ToolDefinition) -> Result<()> {
        definition.validate_declaration()?;

        let name = definition.name.clone();
        match self.tools.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::validation(format!(
                "Tool '{}' is already registered",
                name
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                tracing::info!(tool = %name, params = definition.parameters.len(), "Registering tool");
                slot.insert(Arc::new(definition));
                Ok(())
            }
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    /// All tools, sorted by name.
    pub fn list(&self) -> Vec<Arc<ToolDefinition>> {
        let mut tools: Vec<_> = self.tools.iter().map(|e| e.value().clone()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Tools grouped by namespace; both levels sorted.
    pub fn by_namespace(&self) -> BTreeMap<String, Vec<Arc<ToolDefinition>>> {
        let mut groups: BTreeMap<String, Vec<Arc<ToolDefinition>>> = BTreeMap::new();
        for tool in self.list() {
            groups
                .entry(tool.namespace().to_string())
                .or_default()
                .push(tool);
        }
        groups
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name.
    ///
    /// `params` must be a JSON object (or null for no parameters). Handler
    /// errors are returned as-is; panics are the caller's concern.
    pub async fn execute(&self, ctx: &ToolContext, name: &str, params: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| Error::unknown_tool(name))?;

        let params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::validation(format!(
                    "Parameters for tool '{}' must be an object, got {}",
                    name, other
                )))
            }
        };
        let params = tool.bind_params(tool.unwrap_params(params))?;

        tracing::debug!(tool = %name, "Executing tool");
        tool.handler.handle(ctx, params).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
