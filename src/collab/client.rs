//! MCP client for the collaboration server, built on `rmcp`.
//!
//! The legacy SSE transport (a `GET` event stream plus a POST message
//! endpoint announced by the server) is the default; streamable HTTP is
//! available for servers that speak the newer transport.

use crate::collab::{Connector, RemoteCallResult, RemoteSession, RemoteToolInfo};
use crate::error::CollabError;
use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, ClientCapabilities, ClientInfo, Implementation};
use rmcp::service::{RoleClient, RunningService, ServiceError, ServiceExt};
use rmcp::transport::{SseClientTransport, StreamableHttpClientTransport};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Wire transport used to reach the collaboration server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollabTransport {
    /// `GET` event stream with a server-announced message endpoint.
    #[default]
    Sse,
    /// Single endpoint answering POSTs with JSON or an event stream.
    StreamableHttp,
}

/// Opens MCP sessions against a collaboration server.
#[derive(Debug, Clone)]
pub struct McpHttpConnector {
    transport: CollabTransport,
    client_name: String,
    call_timeout: Duration,
}

impl McpHttpConnector {
    pub fn new(transport: CollabTransport, client_name: &str, call_timeout: Duration) -> Self {
        Self {
            transport,
            client_name: client_name.to_string(),
            call_timeout,
        }
    }

    fn client_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: self.client_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

#[async_trait]
impl Connector for McpHttpConnector {
    async fn connect(&self, url: &str) -> Result<Arc<dyn RemoteSession>, CollabError> {
        let info = self.client_info();
        let handshake = async move {
            match self.transport {
                CollabTransport::Sse => {
                    let transport = SseClientTransport::start(url.to_string())
                        .await
                        .map_err(|e| CollabError::Connect(e.to_string()))?;
                    info.serve(transport)
                        .await
                        .map_err(|e| CollabError::Connect(e.to_string()))
                }
                CollabTransport::StreamableHttp => {
                    let transport = StreamableHttpClientTransport::from_uri(url.to_string());
                    info.serve(transport)
                        .await
                        .map_err(|e| CollabError::Connect(e.to_string()))
                }
            }
        };
        let service = bounded(self.call_timeout, handshake).await??;
        debug!("MCP session open over {:?}", self.transport);

        Ok(Arc::new(McpSession {
            service,
            call_timeout: self.call_timeout,
        }))
    }
}

/// An initialized MCP session.
pub struct McpSession {
    service: RunningService<RoleClient, ClientInfo>,
    call_timeout: Duration,
}

#[async_trait]
impl RemoteSession for McpSession {
    async fn list_tools(&self) -> Result<Vec<RemoteToolInfo>, CollabError> {
        let tools = bounded(self.call_timeout, self.service.list_all_tools())
            .await?
            .map_err(service_error)?;

        tools
            .into_iter()
            .map(|tool| Ok(serde_json::from_value(serde_json::to_value(tool)?)?))
            .collect()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<RemoteCallResult, CollabError> {
        let arguments = match arguments {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                return Err(CollabError::Protocol(format!(
                    "tool arguments must be an object, got {}",
                    other
                )))
            }
        };

        let request = CallToolRequestParam {
            name: name.to_string().into(),
            arguments,
        };
        let result = bounded(self.call_timeout, self.service.call_tool(request))
            .await?
            .map_err(service_error)?;

        Ok(parse_call_result(&serde_json::to_value(result)?))
    }
}

async fn bounded<T>(limit: Duration, fut: impl Future<Output = T>) -> Result<T, CollabError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| CollabError::Timeout(limit))
}

fn service_error(err: ServiceError) -> CollabError {
    match err {
        ServiceError::McpError(e) => CollabError::Rpc {
            code: i64::from(e.code.0),
            message: e.message.to_string(),
        },
        other => CollabError::Service(other.to_string()),
    }
}

/// Flatten MCP `content` items into text.
fn parse_call_result(result: &Value) -> RemoteCallResult {
    let mut text = String::new();
    for item in result.get("content").and_then(Value::as_array).into_iter().flatten() {
        let piece = match item.get("type").and_then(Value::as_str) {
            Some("text") => item.get("text").and_then(Value::as_str).unwrap_or("").to_string(),
            Some(kind @ ("image" | "audio")) => format!(
                "[{}: {}]",
                kind,
                item.get("mimeType").and_then(Value::as_str).unwrap_or("unknown")
            ),
            Some("resource") => format!(
                "[resource: {}]",
                item.pointer("/resource/uri").and_then(Value::as_str).unwrap_or("?")
            ),
            Some("resource_link") => format!(
                "[resource-link: {}]",
                item.get("uri").and_then(Value::as_str).unwrap_or("?")
            ),
            _ => continue,
        };
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&piece);
    }

    RemoteCallResult {
        text,
        is_error: result.get("isError").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn call_results_flatten_content() {
        let result = json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "data": "...", "mimeType": "image/png"},
                {"type": "resource", "resource": {"uri": "file:///notes.md", "text": "n"}},
                {"type": "text", "text": "second"}
            ],
            "isError": true
        });
        let parsed = parse_call_result(&result);
        assert_eq!(parsed.text, "first\n[image: image/png]\n[resource: file:///notes.md]\nsecond");
        assert!(parsed.is_error);
    }

    #[test]
    fn missing_is_error_means_success() {
        let parsed = parse_call_result(&json!({"content": [{"type": "text", "text": "ok"}]}));
        assert_eq!(parsed, RemoteCallResult { text: "ok".into(), is_error: false });
    }

    #[test]
    fn transport_names_in_config() {
        #[derive(Deserialize)]
        struct Wrapper {
            transport: CollabTransport,
        }
        let sse: Wrapper = toml::from_str("transport = \"sse\"").unwrap();
        assert_eq!(sse.transport, CollabTransport::Sse);
        let http: Wrapper = toml::from_str("transport = \"streamable_http\"").unwrap();
        assert_eq!(http.transport, CollabTransport::StreamableHttp);
        assert_eq!(CollabTransport::default(), CollabTransport::Sse);
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let err = bounded(Duration::from_millis(10), tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::Timeout(_)));
    }
}
