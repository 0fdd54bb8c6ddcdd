//! Tool trait and schema types shared by built-in and remote tools.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Arguments after validation: defaults applied, types coerced.
pub type ToolArgs = Map<String, Value>;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Map a JSON Schema `type` keyword. Returns `None` for `null` or unknown names.
    pub fn from_schema(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// Declaration of a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    /// `None` accepts any JSON value (remote tools with untyped properties).
    pub param_type: Option<ParamType>,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
    /// Allowed string values, if the parameter is an enumeration.
    pub allowed: Option<Vec<String>>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: Some(param_type),
            required: true,
            default: None,
            description: description.into(),
            allowed: None,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        default: Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: Some(param_type),
            required: false,
            default: Some(default),
            description: description.into(),
            allowed: None,
        }
    }

    /// Restrict the parameter to a fixed set of string values.
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

/// Uniform description of a tool: name, description and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn find_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON Schema for the parameters. This is the wire contract served to
    /// MCP callers and the inference endpoint.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for p in &self.params {
            let mut prop = Map::new();
            if let Some(t) = p.param_type {
                prop.insert("type".into(), json!(t.to_string()));
            }
            if !p.description.is_empty() {
                prop.insert("description".into(), json!(p.description));
            }
            if let Some(default) = &p.default {
                prop.insert("default".into(), default.clone());
            }
            if let Some(allowed) = &p.allowed {
                prop.insert("enum".into(), json!(allowed));
            }
            properties.insert(p.name.clone(), Value::Object(prop));

            if p.required {
                required.push(p.name.clone());
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.json_schema(),
        }
    }
}

/// Definition of a tool as exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub raw: Option<Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            raw: None,
        }
    }

    pub fn with_raw(text: impl Into<String>, raw: Value) -> Self {
        Self {
            text: text.into(),
            raw: Some(raw),
        }
    }
}

/// A capability the registry can dispatch to.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema used for validation and for the published catalog.
    fn spec(&self) -> &ToolSpec;

    /// Run the tool. `args` has already been validated against `spec()`.
    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError>;
}

// -- Argument accessors ------------------------------------------------------

/// Read a validated string argument.
pub fn arg_str<'a>(tool: &str, args: &'a ToolArgs, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::validation(tool, format!("missing '{}' argument", name)))
}

/// Read a validated integer argument.
pub fn arg_i64(tool: &str, args: &ToolArgs, name: &str) -> Result<i64, ToolError> {
    args.get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::validation(tool, format!("missing '{}' argument", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_schema_lists_required_and_defaults() {
        let spec = ToolSpec::new("generate_report", "Generate a report")
            .param(ParamSpec::required("topic", ParamType::String, "Research topic"))
            .param(
                ParamSpec::optional("format_type", ParamType::String, json!("markdown"), "")
                    .one_of(&["markdown", "json", "text"]),
            );

        let schema = spec.json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["topic"]));
        assert_eq!(schema["properties"]["topic"]["type"], "string");
        assert_eq!(schema["properties"]["format_type"]["default"], "markdown");
        assert_eq!(schema["properties"]["format_type"]["enum"][1], "json");
        assert!(schema["properties"]["format_type"].get("description").is_none());
    }

    #[test]
    fn param_type_from_schema() {
        assert_eq!(ParamType::from_schema("integer"), Some(ParamType::Integer));
        assert_eq!(ParamType::from_schema("null"), None);
    }
}
