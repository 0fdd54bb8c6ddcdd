//! MCP server over stdio: newline-delimited JSON-RPC 2.0 backed by the
//! tool registry.

use crate::tools::ToolRegistry;
use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// Serve requests until the reader hits EOF.
pub async fn serve<R, W>(registry: &ToolRegistry, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("MCP server ready ({} tools)", registry.len());
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(registry, &line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }

    info!("MCP client closed the connection");
    Ok(())
}

/// Handle one raw line. `None` means nothing is written back.
pub async fn handle_line(registry: &ToolRegistry, line: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(line) {
        Ok(msg) => handle_message(registry, &msg).await,
        Err(e) => {
            warn!("Unparsable MCP message: {}", e);
            Some(error_response(Value::Null, PARSE_ERROR, &format!("parse error: {}", e)))
        }
    }
}

/// Handle one decoded JSON-RPC message.
pub async fn handle_message(registry: &ToolRegistry, msg: &Value) -> Option<Value> {
    let Some(obj) = msg.as_object() else {
        return Some(error_response(Value::Null, INVALID_REQUEST, "request must be a JSON object"));
    };

    let id = obj.get("id").cloned().filter(|v| !v.is_null());
    let Some(method) = obj.get("method").and_then(Value::as_str) else {
        // Responses from the client carry no method and need no answer.
        if id.is_some() && (obj.contains_key("result") || obj.contains_key("error")) {
            return None;
        }
        return Some(error_response(id.unwrap_or(Value::Null), INVALID_REQUEST, "missing method"));
    };

    // Notifications are never answered.
    let Some(id) = id else {
        debug!("MCP notification: {}", method);
        return None;
    };

    let params = obj.get("params").cloned().unwrap_or_else(|| json!({}));
    debug!("MCP request: {}", method);

    let response = match method {
        "initialize" => {
            let protocol = params
                .get("protocolVersion")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_PROTOCOL_VERSION);
            result_response(
                id,
                json!({
                    "protocolVersion": protocol,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            )
        }
        "ping" => result_response(id, json!({})),
        "tools/list" => {
            let tools: Vec<Value> = registry
                .definitions()
                .into_iter()
                .map(|d| {
                    json!({
                        "name": d.name,
                        "description": d.description,
                        "inputSchema": d.parameters,
                    })
                })
                .collect();
            result_response(id, json!({ "tools": tools }))
        }
        "tools/call" => {
            let Some(name) = params.get("name").and_then(Value::as_str) else {
                return Some(error_response(id, INVALID_PARAMS, "tools/call requires a 'name'"));
            };
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            let result = registry.invoke(name, &arguments).await;
            result_response(
                id,
                json!({
                    "content": [{ "type": "text", "text": result.text }],
                    "isError": !result.success,
                }),
            )
        }
        other => error_response(id, METHOD_NOT_FOUND, &format!("method not found: {}", other)),
    };
    Some(response)
}

fn result_response(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::SummarizeTool;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::default();
        registry.register(Arc::new(SummarizeTool::new())).unwrap();
        registry
    }

    #[tokio::test]
    async fn initialize_echoes_protocol_version() {
        let resp = handle_message(
            &registry(),
            &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                    "params": {"protocolVersion": "2024-11-05"}}),
        )
        .await
        .unwrap();
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["serverInfo"]["name"], "research-assistant");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_exposes_schemas() {
        let resp = handle_message(&registry(), &json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"}))
            .await
            .unwrap();
        let tool = &resp["result"]["tools"][0];
        assert_eq!(tool["name"], "summarize");
        assert_eq!(tool["inputSchema"]["required"], json!(["text"]));
        assert_eq!(resp["id"], "a");
    }

    #[tokio::test]
    async fn tool_failures_are_error_results() {
        let reg = registry();
        let ok = handle_message(
            &reg,
            &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                    "params": {"name": "summarize", "arguments": {"text": "a b c", "max_length": 1}}}),
        )
        .await
        .unwrap();
        assert_eq!(ok["result"]["isError"], false);
        assert!(ok["result"]["content"][0]["text"].as_str().unwrap().contains("- a..."));

        let unknown = handle_message(
            &reg,
            &json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await
        .unwrap();
        assert_eq!(unknown["result"]["isError"], true);
        assert!(unknown.get("error").is_none());
    }

    #[tokio::test]
    async fn protocol_errors() {
        let reg = registry();
        let missing = handle_message(&reg, &json!({"jsonrpc": "2.0", "id": 4, "method": "resources/list"}))
            .await
            .unwrap();
        assert_eq!(missing["error"]["code"], METHOD_NOT_FOUND);

        let garbage = handle_line(&reg, "{not json").await.unwrap();
        assert_eq!(garbage["error"]["code"], PARSE_ERROR);
        assert!(garbage["id"].is_null());

        let batch = handle_message(&reg, &json!([1, 2])).await.unwrap();
        assert_eq!(batch["error"]["code"], INVALID_REQUEST);

        let no_name = handle_message(&reg, &json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call"}))
            .await
            .unwrap();
        assert_eq!(no_name["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let reg = registry();
        assert!(handle_message(&reg, &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await
            .is_none());
        assert!(handle_message(&reg, &json!({"jsonrpc": "2.0", "id": 9, "result": {}}))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn serves_newline_delimited_stream() {
        let input: &[u8] = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n\
            {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
            {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n";
        let mut output = Vec::new();
        serve(&registry(), input, &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let replies: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["id"], 1);
        assert_eq!(replies[1]["result"]["tools"].as_array().unwrap().len(), 1);
    }
}
