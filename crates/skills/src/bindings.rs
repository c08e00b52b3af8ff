//! Model-facing documentation and worker-side bindings for the registry.
//!
//! Both outputs are deterministic: namespaces are sorted, and tools are
//! sorted by name within each namespace.

use serde_json::Value;

use crate::registry::{ToolDefinition, ToolRegistry};

/// Module the generated bindings import `callTool` from.
pub const RUNTIME_MODULE: &str = "./runtime.ts";

impl ToolRegistry {
    /// Markdown listing of every tool, embedded in the capability description
    /// shown to the model.
    pub fn generate_documentation(&self) -> String {
        let mut lines = vec!["# Available Tools\n".to_string()];
        lines.push(
            "These tools are available to call from TypeScript code in execute_code:\n".to_string(),
        );

        for (namespace, tools) in self.by_namespace() {
            lines.push(format!("## {}\n", namespace));
            for tool in tools {
                lines.push(format!("### {}", tool.name));
                lines.push(format!("{}\n", tool.description));
                if !tool.parameters.is_empty() {
                    lines.push("**Parameters:**".to_string());
                    for param in &tool.parameters {
                        let optional = if param.required { "" } else { " (optional)" };
                        let default = param
                            .default
                            .as_ref()
                            .map(|d| format!(", default: {}", render_default(d)))
                            .unwrap_or_default();
                        lines.push(format!(
                            "- `{}` ({}{}{}): {}",
                            param.name, param.kind, optional, default, param.description
                        ));
                    }
                    lines.push(String::new());
                }
            }
        }

        lines.join("\n")
    }

    /// TypeScript module exposing one async function per tool, grouped into
    /// one exported object per namespace.
    pub fn generate_worker_bindings(&self) -> String {
        let mut lines = vec![
            "// Auto-generated - do not edit".to_string(),
            format!("import {{ callTool }} from \"{}\";", RUNTIME_MODULE),
            String::new(),
        ];

        for (namespace, tools) in self.by_namespace() {
            lines.push(format!("export const {} = {{", namespace));
            let count = tools.len();
            for (i, tool) in tools.iter().enumerate() {
                lines.push(format!("  /** {} */", doc_comment(&tool.description)));
                lines.push(format!(
                    "  {}: ({}): Promise<unknown> => callTool(\"{}\", {}),",
                    tool.action(),
                    signature(tool),
                    tool.name,
                    params_object(tool)
                ));
                if i + 1 < count {
                    lines.push(String::new());
                }
            }
            lines.push("};".to_string());
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

/// Required parameters first, then optional ones, each group in declaration order.
fn signature(tool: &ToolDefinition) -> String {
    let required = tool.parameters.iter().filter(|p| p.required);
    let optional = tool.parameters.iter().filter(|p| !p.required);
    required
        .chain(optional)
        .map(|p| {
            let marker = if p.required { "" } else { "?" };
            format!("{}{}: {}", p.name, marker, p.kind.ts_type())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn params_object(tool: &ToolDefinition) -> String {
    if tool.parameters.is_empty() {
        return "{}".to_string();
    }
    let names: Vec<_> = tool.parameters.iter().map(|p| p.name.as_str()).collect();
    format!("{{ {} }}", names.join(", "))
}

fn render_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn doc_comment(text: &str) -> String {
    text.replace("*/", "*\\/").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::json;
    use std::sync::Arc;
    use warden_core::{traits::ToolHandler, types::{ParamKind, ToolParameter}};

    fn noop() -> Arc<dyn ToolHandler> {
        handler_fn(|_ctx, _params| async move { Ok(Value::Null) })
    }

    fn sample_registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry
            .register(
                ToolDefinition::new("datastore.query", "Run a SQL query", noop())
                    .with_parameter(
                        ToolParameter::optional("limit", ParamKind::Number, "Row limit")
                            .with_default(json!(100)),
                    )
                    .with_parameter(ToolParameter::required("sql", ParamKind::String, "SQL text")),
            )
            .unwrap();
        registry
            .register(ToolDefinition::new("datastore.tables", "List tables", noop()))
            .unwrap();
        registry
            .register(
                ToolDefinition::new("dns.lookup", "Resolve a domain */", noop()).with_parameter(
                    ToolParameter::optional("kind", ParamKind::String, "Record type")
                        .with_default(json!("A")),
                ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_documentation_layout() {
        let docs = sample_registry().generate_documentation();

        let expected = "\
# Available Tools

These tools are available to call from TypeScript code in execute_code:

## datastore

### datastore.query
Run a SQL query

**Parameters:**
- `limit` (number (optional), default: 100): Row limit
- `sql` (string): SQL text

### datastore.tables
List tables

## dns

### dns.lookup
Resolve a domain */

**Parameters:**
- `kind` (string (optional), default: A): Record type
";
        assert_eq!(docs, expected);
    }

    #[test]
    fn test_documentation_is_deterministic() {
        let a = sample_registry().generate_documentation();
        let b = sample_registry().generate_documentation();
        assert_eq!(a, b);
    }

    #[test]
    fn test_worker_bindings() {
        let ts = sample_registry().generate_worker_bindings();

        assert!(ts.starts_with("// Auto-generated - do not edit\nimport { callTool } from \"./runtime.ts\";\n"));
        assert!(ts.contains("export const datastore = {"));
        assert!(ts.contains(
            "  query: (sql: string, limit?: number): Promise<unknown> => callTool(\"datastore.query\", { limit, sql }),"
        ));
        assert!(ts.contains(
            "  tables: (): Promise<unknown> => callTool(\"datastore.tables\", {}),"
        ));
        assert!(ts.contains("  /** Resolve a domain *\\/ */"));

        let datastore_at = ts.find("export const datastore").unwrap();
        let dns_at = ts.find("export const dns").unwrap();
        assert!(datastore_at < dns_at);
    }
}
