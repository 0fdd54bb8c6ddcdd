//! `summarize`: bounded word prefix. Real summarization is left to the model
//! that calls the tool.

use crate::error::ToolError;
use crate::tools::traits::{arg_i64, arg_str, ParamSpec, ParamType, Tool, ToolArgs, ToolOutput, ToolSpec};
use async_trait::async_trait;
use serde_json::json;

pub struct SummarizeTool {
    spec: ToolSpec,
}

impl SummarizeTool {
    pub fn new() -> Self {
        let spec = ToolSpec::new("summarize", "Summarize a technical paper or long document")
            .param(ParamSpec::required("text", ParamType::String, "The full text to summarize"))
            .param(ParamSpec::optional(
                "max_length",
                ParamType::Integer,
                json!(500),
                "Maximum summary length in words",
            ));
        Self { spec }
    }
}

impl Default for SummarizeTool {
    fn default() -> Self {
        Self::new()
    }
}

/// First `max_words` words of `text`, and whether anything was cut.
pub fn word_prefix(text: &str, max_words: usize) -> (String, bool) {
    let mut words = text.split_whitespace();
    let prefix = words.by_ref().take(max_words).collect::<Vec<_>>().join(" ");
    (prefix, words.next().is_some())
}

#[async_trait]
impl Tool for SummarizeTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let text = arg_str(&self.spec.name, &args, "text")?;
        let max_length = arg_i64(&self.spec.name, &args, "max_length")?;
        if max_length < 1 {
            return Err(ToolError::validation(&self.spec.name, "max_length must be at least 1"));
        }

        let (prefix, truncated) = word_prefix(text, max_length as usize);
        let ellipsis = if truncated { "..." } else { "" };
        Ok(ToolOutput::with_raw(
            format!(
                "Summary (max {} words):\n\nKey Points:\n- {}{}",
                max_length, prefix, ellipsis
            ),
            json!({ "truncated": truncated }),
        ))
    }
}
