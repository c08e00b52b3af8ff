use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Tool Types
// =============================================================================

/// JSON kind accepted by a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    /// Whether a JSON value has this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }

    /// TypeScript type used in the worker bindings.
    pub fn ts_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "Record<string, unknown>",
            ParamKind::Array => "unknown[]",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    /// Filled in when an optional parameter is omitted.
    pub default: Option<Value>,
    pub description: String,
}

impl ToolParameter {
    /// A parameter the caller must supply.
    pub fn required(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    /// A parameter the caller may omit.
    pub fn optional(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Tool definition handed to the model backend as the available-tools payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCapabilityDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool input.
    pub input_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_matches() {
        assert!(ParamKind::Number.matches(&json!(1.5)));
        assert!(!ParamKind::Number.matches(&json!("1")));
        assert!(ParamKind::Object.matches(&json!({})));
        assert!(ParamKind::Array.matches(&json!([1])));
        assert!(!ParamKind::Boolean.matches(&Value::Null));
    }

    #[test]
    fn test_parameter_builders() {
        let param = ToolParameter::optional("limit", ParamKind::Number, "Row limit")
            .with_default(json!(100));
        assert!(!param.required);
        assert_eq!(param.default, Some(json!(100)));
        assert_eq!(param.kind.to_string(), "number");
        assert_eq!(ParamKind::Object.ts_type(), "Record<string, unknown>");
    }
}
