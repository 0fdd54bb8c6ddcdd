//! Argument validation against a `ToolSpec`.
//!
//! Coercion is limited to conversions with exactly one sensible reading:
//! numeric strings to integers/numbers, whole floats to integers, integers
//! to numbers, and the literal strings `"true"` / `"false"` to booleans.

use crate::error::ToolError;
use crate::tools::traits::{ParamSpec, ParamType, ToolArgs, ToolSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// How to treat argument keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentPolicy {
    /// Reject undeclared keys.
    #[default]
    Strict,
    /// Drop undeclared keys.
    Lenient,
}

/// Validate `args` against `spec`, returning the normalized argument map.
///
/// `null` for the whole argument set is an empty object; `null` for a single
/// parameter counts as omitted.
pub fn validate(spec: &ToolSpec, args: &Value, policy: ArgumentPolicy) -> Result<ToolArgs, ToolError> {
    let input = match args {
        Value::Object(map) => map.clone(),
        Value::Null => ToolArgs::new(),
        other => {
            return Err(ToolError::validation(
                &spec.name,
                format!("arguments must be a JSON object, got {}", json_kind(other)),
            ))
        }
    };

    if policy == ArgumentPolicy::Strict {
        let mut unknown: Vec<&str> = input
            .keys()
            .filter(|k| spec.find_param(k).is_none())
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(ToolError::validation(
                &spec.name,
                format!("unknown parameter(s): {}", unknown.join(", ")),
            ));
        }
    }

    let mut out = ToolArgs::new();
    for param in &spec.params {
        match input.get(&param.name).filter(|v| !v.is_null()) {
            Some(value) => {
                let value = coerce(&spec.name, param, value)?;
                check_allowed(&spec.name, param, &value)?;
                out.insert(param.name.clone(), value);
            }
            None if param.required => {
                return Err(ToolError::validation(
                    &spec.name,
                    format!("missing required parameter '{}'", param.name),
                ));
            }
            None => {
                if let Some(default) = &param.default {
                    out.insert(param.name.clone(), default.clone());
                }
            }
        }
    }

    Ok(out)
}

fn coerce(tool: &str, param: &ParamSpec, value: &Value) -> Result<Value, ToolError> {
    let Some(expected) = param.param_type else {
        return Ok(value.clone());
    };

    let coerced = match (expected, value) {
        (ParamType::String, Value::String(_)) => Some(value.clone()),

        (ParamType::Integer, Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                Some(value.clone())
            } else {
                n.as_f64().and_then(whole_float).map(Value::from)
            }
        }
        (ParamType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),

        (ParamType::Number, Value::Number(_)) => Some(value.clone()),
        (ParamType::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),

        (ParamType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParamType::Boolean, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },

        (ParamType::Object, Value::Object(_)) => Some(value.clone()),
        (ParamType::Array, Value::Array(_)) => Some(value.clone()),
        _ => None,
    };

    coerced.ok_or_else(|| {
        ToolError::validation(
            tool,
            format!(
                "parameter '{}' expects {}, got {}",
                param.name,
                expected,
                json_kind(value)
            ),
        )
    })
}

fn whole_float(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn check_allowed(tool: &str, param: &ParamSpec, value: &Value) -> Result<(), ToolError> {
    let Some(allowed) = &param.allowed else {
        return Ok(());
    };
    match value.as_str() {
        Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
        _ => Err(ToolError::validation(
            tool,
            format!(
                "parameter '{}' must be one of: {}",
                param.name,
                allowed.join(", ")
            ),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
