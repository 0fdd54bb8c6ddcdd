//! `generate_report`: template a report and save it to the reports directory.

use crate::error::ToolError;
use crate::text::{prefix_chars, slugify};
use crate::tools::traits::{arg_str, ParamSpec, ParamType, Tool, ToolArgs, ToolOutput, ToolSpec};
use crate::types::ReportFormat;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

const SUMMARY_CHARS: usize = 500;

/// Render a report. Pure: same inputs, same text.
pub fn render_report(topic: &str, findings: &str, format: ReportFormat, generated: &str, agent: &str) -> String {
    match format {
        ReportFormat::Markdown => format!(
            "# Research Report: {topic}\n\n\
             **Generated:** {generated}  \n\
             **Agent:** {agent}\n\n\
             ---\n\n\
             ## Summary\n\n\
             {summary}\n\n\
             ## Detailed Findings\n\n\
             {findings}\n\n\
             ---\n\n\
             *Report generated by {agent}*\n",
            summary = prefix_chars(findings, SUMMARY_CHARS),
        ),
        ReportFormat::Json => {
            let doc = json!({
                "topic": topic,
                "timestamp": generated,
                "summary": prefix_chars(findings, SUMMARY_CHARS),
                "findings": findings,
            });
            // Serializing a `Value` built from strings cannot fail.
            serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string())
        }
        ReportFormat::Text => format!("RESEARCH REPORT: {topic}\nGenerated: {generated}\n\n{findings}\n"),
    }
}

/// `report_<slug>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn report_file_name(topic: &str, format: ReportFormat, at: &DateTime<Local>) -> String {
    format!(
        "report_{}_{}.{}",
        slugify(topic),
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub struct GenerateReportTool {
    spec: ToolSpec,
    reports_dir: PathBuf,
    agent_name: String,
}

impl GenerateReportTool {
    pub fn new(reports_dir: impl Into<PathBuf>, agent_name: impl Into<String>) -> Self {
        let spec = ToolSpec::new("generate_report", "Generate a structured research report")
            .param(ParamSpec::required("topic", ParamType::String, "Research topic"))
            .param(ParamSpec::required("findings", ParamType::String, "Research findings"))
            .param(
                ParamSpec::optional("format_type", ParamType::String, json!("markdown"), "Output format")
                    .one_of(&ReportFormat::NAMES),
            );
        Self {
            spec,
            reports_dir: reports_dir.into(),
            agent_name: agent_name.into(),
        }
    }

    /// Write `contents` to a new file, adding a counter if the name is taken.
    async fn save(&self, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.reports_dir).await?;

        let base = Path::new(file_name);
        let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
        let ext = base.extension().and_then(|s| s.to_str()).unwrap_or("txt");

        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                file_name.to_string()
            } else {
                format!("{}_{}.{}", stem, attempt, ext)
            };
            let path = self.reports_dir.join(name);
            match tokio::fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(contents.as_bytes()).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempt < 100 => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl Tool for GenerateReportTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let topic = arg_str(&self.spec.name, &args, "topic")?.trim();
        let findings = arg_str(&self.spec.name, &args, "findings")?;
        let format: ReportFormat = arg_str(&self.spec.name, &args, "format_type")?
            .parse()
            .map_err(|e: String| ToolError::validation(&self.spec.name, e))?;

        let now = Local::now();
        let report = render_report(
            topic,
            findings,
            format,
            &now.format("%Y-%m-%d %H:%M").to_string(),
            &self.agent_name,
        );

        let path = self
            .save(&report_file_name(topic, format, &now), &report)
            .await
            .map_err(|e| ToolError::persistence(format!("failed to save report: {}", e)))?;
        info!("Report saved to {}", path.display());

        Ok(ToolOutput::with_raw(
            report,
            json!({ "path": path.display().to_string(), "format": format.to_string() }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_report_parses() {
        let text = render_report("X", "Y", ReportFormat::Json, "2025-01-01 09:00", "agent");
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["topic"], "X");
        assert_eq!(doc["findings"], "Y");
        assert_eq!(doc["summary"], "Y");
        assert_eq!(doc["timestamp"], "2025-01-01 09:00");
    }

    #[test]
    fn markdown_report_has_summary_and_details() {
        let findings = "f".repeat(600);
        let text = render_report("Protocols", &findings, ReportFormat::Markdown, "now", "Research Assistant");
        assert!(text.starts_with("# Research Report: Protocols\n\n**Generated:** now  \n**Agent:** Research Assistant\n"));
        assert!(text.contains(&format!("## Summary\n\n{}\n\n## Detailed", "f".repeat(500))));
        assert!(text.contains(&format!("## Detailed Findings\n\n{}\n", findings)));
    }

    #[test]
    fn summary_is_the_first_500_chars_without_ellipsis() {
        let findings = "é".repeat(700);
        let text = render_report("T", &findings, ReportFormat::Json, "now", "agent");
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        let summary = doc["summary"].as_str().unwrap();
        assert_eq!(summary.chars().count(), 500);
        assert!(!summary.ends_with("..."));
        assert!(findings.starts_with(summary));
    }

    #[test]
    fn text_report_layout() {
        let text = render_report("AI Agents", "Finding A", ReportFormat::Text, "2025-01-01 09:00", "a");
        assert_eq!(text, "RESEARCH REPORT: AI Agents\nGenerated: 2025-01-01 09:00\n\nFinding A\n");
    }

    #[test]
    fn file_names_use_slug_and_extension() {
        let at = Local.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(
            report_file_name("AI Agents", ReportFormat::Markdown, &at),
            "report_ai_agents_20250203_040506.md"
        );
        assert_eq!(
            report_file_name("a/b", ReportFormat::Text, &at),
            "report_ab_20250203_040506.txt"
        );
    }

    #[tokio::test]
    async fn same_name_gets_a_counter() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GenerateReportTool::new(dir.path(), "agent");
        let first = tool.save("report_x_1.md", "one").await.unwrap();
        let second = tool.save("report_x_1.md", "two").await.unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("report_x_1_2.md"));
        assert_eq!(std::fs::read_to_string(first).unwrap(), "one");
    }

    #[tokio::test]
    async fn save_failure_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();

        let tool = GenerateReportTool::new(&blocker, "agent");
        let args = json!({"topic": "t", "findings": "f", "format_type": "text"});
        let err = tool.execute(args.as_object().cloned().unwrap()).await.unwrap_err();
        assert!(matches!(err, ToolError::Persistence(_)));
    }
}
