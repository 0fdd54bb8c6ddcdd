//! `log_activity` and `query_logs` over an `ActivityStore`.

use crate::error::ToolError;
use crate::state::ActivityStore;
use crate::text::{prefix_chars, truncate_chars};
use crate::tools::traits::{arg_i64, arg_str, ParamSpec, ParamType, Tool, ToolArgs, ToolOutput, ToolSpec};
use crate::types::LogEntry;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

pub const NO_MATCHING_LOGS: &str = "No matching logs found.";

// ---------------------------------------------------------------------------
// log_activity
// ---------------------------------------------------------------------------

pub struct LogActivityTool {
    spec: ToolSpec,
    store: Arc<dyn ActivityStore>,
}

impl LogActivityTool {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        let spec = ToolSpec::new(
            "log_activity",
            "Log an activity (e.g. a competitor announcement) for later tracking",
        )
        .param(ParamSpec::required(
            "subject",
            ParamType::String,
            "Who the activity is about (e.g., Google A2A, AGNTCY)",
        ))
        .param(ParamSpec::required("activity", ParamType::String, "Description of the activity"))
        .param(ParamSpec::optional("source", ParamType::String, json!(""), "Source URL"));
        Self { spec, store }
    }
}

#[async_trait]
impl Tool for LogActivityTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let subject = arg_str(&self.spec.name, &args, "subject")?.trim();
        let activity = arg_str(&self.spec.name, &args, "activity")?.trim();
        if subject.is_empty() || activity.is_empty() {
            return Err(ToolError::validation(
                &self.spec.name,
                "subject and activity must not be empty",
            ));
        }

        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339(),
            subject: subject.to_string(),
            activity: activity.to_string(),
            source: arg_str(&self.spec.name, &args, "source")?.trim().to_string(),
        };
        self.store
            .append(entry.clone())
            .await
            .map_err(|e| ToolError::persistence(format!("{:#}", e)))?;

        Ok(ToolOutput::with_raw(
            format!("Logged activity for {}: {}", entry.subject, truncate_chars(&entry.activity, 60)),
            json!(entry),
        ))
    }
}

// ---------------------------------------------------------------------------
// query_logs
// ---------------------------------------------------------------------------

pub struct QueryLogsTool {
    spec: ToolSpec,
    store: Arc<dyn ActivityStore>,
}

impl QueryLogsTool {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        let spec = ToolSpec::new("query_logs", "Get logged activities, most recent last")
            .param(ParamSpec::optional(
                "filter",
                ParamType::String,
                json!(""),
                "Case-insensitive subject filter (optional)",
            ))
            .param(ParamSpec::optional("limit", ParamType::Integer, json!(50), "Max entries to return"));
        Self { spec, store }
    }
}

/// Entries whose subject contains `filter` (case-insensitive), keeping the
/// last `limit` in insertion order.
pub fn select_recent(entries: Vec<LogEntry>, filter: &str, limit: usize) -> Vec<LogEntry> {
    let needle = filter.trim().to_lowercase();
    let mut matching: Vec<LogEntry> = entries
        .into_iter()
        .filter(|e| needle.is_empty() || e.subject.to_lowercase().contains(&needle))
        .collect();
    let skip = matching.len().saturating_sub(limit);
    matching.drain(..skip);
    matching
}

#[async_trait]
impl Tool for QueryLogsTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let filter = arg_str(&self.spec.name, &args, "filter")?;
        let limit = arg_i64(&self.spec.name, &args, "limit")?.max(0) as usize;

        let entries = self
            .store
            .read_all()
            .await
            .map_err(|e| ToolError::persistence(format!("{:#}", e)))?;
        let selected = select_recent(entries, filter, limit);

        if selected.is_empty() {
            return Ok(ToolOutput::with_raw(NO_MATCHING_LOGS, json!([])));
        }

        let text = selected
            .iter()
            .map(|e| {
                format!(
                    "[{}] {}: {}",
                    prefix_chars(&e.timestamp, 10),
                    e.subject,
                    truncate_chars(&e.activity, 80)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::with_raw(text, json!(selected)))
    }
}
