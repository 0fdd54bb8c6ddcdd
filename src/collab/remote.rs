//! Remote collaboration tools exposed through the local `Tool` trait.

use crate::collab::{RemoteSession, RemoteToolInfo};
use crate::error::ToolError;
use crate::tools::{ParamSpec, ParamType, Tool, ToolArgs, ToolOutput, ToolSpec};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Forwards invocations to a tool on the collaboration server.
pub struct RemoteTool {
    spec: ToolSpec,
    session: Arc<dyn RemoteSession>,
}

impl RemoteTool {
    pub fn new(session: Arc<dyn RemoteSession>, info: &RemoteToolInfo) -> Self {
        Self {
            spec: spec_from_schema(info),
            session,
        }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let result = self
            .session
            .call_tool(&self.spec.name, Value::Object(args))
            .await
            .map_err(|e| ToolError::external("collaboration server", e))?;

        if result.is_error {
            return Err(ToolError::external("collaboration server", result.text));
        }
        Ok(ToolOutput::text(result.text))
    }
}

/// Translate an MCP `inputSchema` into parameter specs.
pub fn spec_from_schema(info: &RemoteToolInfo) -> ToolSpec {
    let description = info
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or("Remote collaboration tool");
    let mut spec = ToolSpec::new(&info.name, description);

    let schema = &info.input_schema;
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return spec;
    };

    for (name, prop) in properties {
        let allowed = prop.get("enum").and_then(Value::as_array).and_then(|values| {
            values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        });

        spec = spec.param(ParamSpec {
            name: name.clone(),
            param_type: schema_type(prop),
            required: required.contains(&name.as_str()),
            default: prop.get("default").cloned(),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            allowed,
        });
    }
    spec
}

/// `"type": "string"` or `"type": ["string", "null"]`; anything else is untyped.
fn schema_type(prop: &Value) -> Option<ParamType> {
    match prop.get("type") {
        Some(Value::String(t)) => ParamType::from_schema(t),
        Some(Value::Array(types)) => {
            let non_null: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            match non_null.as_slice() {
                [single] => ParamType::from_schema(single),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::RemoteCallResult;
    use crate::error::CollabError;
    use serde_json::json;
    use std::sync::Mutex;

    struct Recorder {
        calls: Mutex<Vec<(String, Value)>>,
        reply: RemoteCallResult,
    }

    #[async_trait]
    impl RemoteSession for Recorder {
        async fn list_tools(&self) -> Result<Vec<RemoteToolInfo>, CollabError> {
            Ok(Vec::new())
        }

        async fn call_tool(&self, name: &str, arguments: Value) -> Result<RemoteCallResult, CollabError> {
            self.calls.lock().unwrap().push((name.to_string(), arguments));
            Ok(self.reply.clone())
        }
    }

    fn send_message_info() -> RemoteToolInfo {
        serde_json::from_value(json!({
            "name": "send_message",
            "description": "Send a message to a thread",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "threadId": {"type": "string", "description": "Thread id"},
                    "content": {"type": "string"},
                    "mentions": {"type": "array"},
                    "priority": {"type": ["integer", "null"], "default": 1},
                    "mode": {"enum": ["fast", "slow"]},
                    "extra": {}
                },
                "required": ["threadId", "content"]
            }
        }))
        .unwrap()
    }

    #[test]
    fn translates_input_schema() {
        let spec = spec_from_schema(&send_message_info());
        assert_eq!(spec.name, "send_message");
        assert_eq!(spec.params.len(), 6);

        let thread = spec.find_param("threadId").unwrap();
        assert!(thread.required);
        assert_eq!(thread.param_type, Some(ParamType::String));
        assert_eq!(thread.description, "Thread id");

        let priority = spec.find_param("priority").unwrap();
        assert!(!priority.required);
        assert_eq!(priority.param_type, Some(ParamType::Integer));
        assert_eq!(priority.default, Some(json!(1)));

        let mode = spec.find_param("mode").unwrap();
        assert_eq!(mode.allowed, Some(vec!["fast".to_string(), "slow".to_string()]));
        assert_eq!(spec.find_param("extra").unwrap().param_type, None);
    }

    #[test]
    fn tools_without_schema_get_no_params() {
        let info: RemoteToolInfo = serde_json::from_value(json!({"name": "list_agents"})).unwrap();
        let spec = spec_from_schema(&info);
        assert!(spec.params.is_empty());
        assert_eq!(spec.description, "Remote collaboration tool");
    }

    #[tokio::test]
    async fn forwards_calls_and_maps_remote_errors() {
        let session = Arc::new(Recorder {
            calls: Mutex::new(Vec::new()),
            reply: RemoteCallResult {
                text: "thread not found".into(),
                is_error: true,
            },
        });
        let tool = RemoteTool::new(session.clone(), &send_message_info());

        let args = json!({"threadId": "t1", "content": "hi"}).as_object().cloned().unwrap();
        let err = tool.execute(args).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("thread not found"));

        let calls = session.calls.lock().unwrap();
        assert_eq!(calls[0].0, "send_message");
        assert_eq!(calls[0].1["threadId"], "t1");
    }
}
