//! Configuration schema for config.toml.

use crate::collab::{CollabTransport, RetryPolicy};
use crate::tools::ArgumentPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Display name used in reports and the console banner.
    pub agent_name: String,

    /// Identity announced to the collaboration server.
    pub agent_id: String,
    pub agent_description: String,

    /// Collaboration server endpoint. Empty runs standalone.
    pub collab_url: String,

    /// `sse` (event stream plus message endpoint) or `streamable_http`.
    pub collab_transport: CollabTransport,

    /// Per-request timeout for remote tool calls, in seconds.
    pub collab_timeout_secs: u64,

    /// Timeout for search, fetch and inference requests, in seconds.
    pub http_timeout_secs: u64,

    /// OpenAI-compatible chat-completions base URL.
    pub inference_url: String,
    pub inference_api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,

    /// Maximum inference rounds per user turn.
    pub max_iterations: u32,

    /// Conversation messages kept between turns.
    pub history_limit: usize,

    /// JSON activity log. Empty keeps entries in memory only.
    pub activity_log: String,

    /// Where `generate_report` writes its files.
    pub reports_dir: String,

    /// How unknown tool arguments are treated.
    pub argument_policy: ArgumentPolicy,

    /// Search endpoint (DuckDuckGo HTML).
    pub search_url: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,

    /// Connection attempts and backoff for the collaboration server.
    pub retry: RetryPolicy,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            agent_name: "Research Assistant".into(),
            agent_id: "research_assistant".into(),
            agent_description: "Research assistant agent".into(),
            collab_url: String::new(),
            collab_transport: CollabTransport::Sse,
            collab_timeout_secs: 600,
            http_timeout_secs: 30,
            inference_url: "https://api.openai.com/v1".into(),
            inference_api_key: String::new(),
            model: "gpt-4o-mini".into(),
            temperature: 0.3,
            max_tokens: 4096,
            max_iterations: 20,
            history_limit: 20,
            activity_log: "~/.research-assistant/activity_log.json".into(),
            reports_dir: "~/.research-assistant/reports".into(),
            argument_policy: ArgumentPolicy::Strict,
            search_url: crate::web::search::DuckDuckGo::DEFAULT_URL.into(),
            log_level: "info".into(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ResearchConfig {
    /// Resolve a path that may contain `~` to an absolute path.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).into_owned())
    }

    /// Resolved activity log path, or `None` for the in-memory store.
    pub fn resolved_activity_log(&self) -> Option<PathBuf> {
        let path = self.activity_log.trim();
        (!path.is_empty()).then(|| self.resolve_path(path))
    }

    pub fn resolved_reports_dir(&self) -> PathBuf {
        self.resolve_path(&self.reports_dir)
    }

    /// Collaboration endpoint, if one is configured.
    pub fn endpoint(&self) -> Option<&str> {
        Some(self.collab_url.trim()).filter(|u| !u.is_empty())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn collab_timeout(&self) -> Duration {
        Duration::from_secs(self.collab_timeout_secs.max(1))
    }
}
