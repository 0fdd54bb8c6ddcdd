//! Error taxonomy for tool dispatch and collaboration connections.

use thiserror::Error;

/// Failures surfaced by the tool registry and its handlers.
///
/// Every variant is contained at the registry boundary: `ToolRegistry::invoke`
/// turns them into a failed `ToolResult` instead of returning them.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Missing, unknown or mistyped arguments.
    #[error("invalid arguments for '{tool}': {message}")]
    Validation { tool: String, message: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),

    /// A delegated collaborator (search, HTTP fetch, remote server) failed.
    #[error("{service} error: {message}")]
    ExternalService { service: String, message: String },

    /// Reading or writing the activity log or a report file failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ToolError {
    pub fn validation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ExternalService {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn persistence(message: impl std::fmt::Display) -> Self {
        Self::Persistence(message.to_string())
    }

    /// Only external-service failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService { .. })
    }
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Failures while talking to the collaboration server.
#[derive(Debug, Error)]
pub enum CollabError {
    #[error("invalid collaboration endpoint '{url}': {message}")]
    InvalidEndpoint { url: String, message: String },

    /// The transport could not be opened or the initialize handshake failed.
    #[error("could not open MCP session: {0}")]
    Connect(String),

    #[error("MCP request failed: {0}")]
    Service(String),

    #[error("no answer within {0:?}")]
    Timeout(std::time::Duration),

    /// JSON-RPC error object returned by the server.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for CollabError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_external_errors_are_retryable() {
        assert!(ToolError::external("search", "timeout").is_retryable());
        assert!(!ToolError::validation("fetch_url", "missing url").is_retryable());
        assert!(!ToolError::UnknownTool("x".into()).is_retryable());
        assert!(!ToolError::persistence("disk full").is_retryable());
    }

    #[test]
    fn messages_name_the_tool() {
        let err = ToolError::validation("web_search", "missing required parameter 'query'");
        assert_eq!(
            err.to_string(),
            "invalid arguments for 'web_search': missing required parameter 'query'"
        );
    }
}
