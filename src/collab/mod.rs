//! Collaboration server integration: connection retries, MCP transport and
//! remote tool adapters.

pub mod client;
pub mod manager;
pub mod remote;
pub mod retry;

pub use client::{CollabTransport, McpHttpConnector};
pub use manager::{ConnectionManager, ConnectionOutcome};
pub use remote::RemoteTool;
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};

use crate::error::CollabError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A tool advertised by the collaboration server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

/// Flattened result of a remote `tools/call`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallResult {
    pub text: String,
    pub is_error: bool,
}

/// An established session with the collaboration server.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<RemoteToolInfo>, CollabError>;
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<RemoteCallResult, CollabError>;
}

/// Opens sessions. One `connect` call is one handshake attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Arc<dyn RemoteSession>, CollabError>;
}

/// Build the endpoint URL carrying this agent's identity.
///
/// `agentId` and `agentDescription` are appended as query parameters,
/// preserving any query the base URL already has.
pub fn collab_url(base: &str, agent_id: &str, description: &str) -> Result<String, CollabError> {
    let base = base.trim();
    let parsed = reqwest::Url::parse(base).map_err(|e| CollabError::InvalidEndpoint {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CollabError::InvalidEndpoint {
            url: base.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    let separator = if parsed.query().is_some() { '&' } else { '?' };
    Ok(format!(
        "{}{}agentId={}&agentDescription={}",
        base,
        separator,
        urlencoding::encode(agent_id),
        urlencoding::encode(description)
    ))
}
