//! `web_search` and `fetch_url`.

use crate::error::ToolError;
use crate::text::truncate_chars;
use crate::tools::traits::{arg_i64, arg_str, ParamSpec, ParamType, Tool, ToolArgs, ToolOutput, ToolSpec};
use crate::web::{PageFetcher, SearchProvider};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const MAX_TITLE_CHARS: usize = 120;
const MAX_SNIPPET_CHARS: usize = 300;
const MAX_SEARCH_RESULTS: i64 = 20;

/// Text returned when the provider finds nothing.
pub const NO_RESULTS: &str = "No results found.";

// ---------------------------------------------------------------------------
// web_search
// ---------------------------------------------------------------------------

pub struct WebSearchTool {
    spec: ToolSpec,
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        let spec = ToolSpec::new("web_search", "Search the web for information on any topic")
            .param(ParamSpec::required("query", ParamType::String, "Search query"))
            .param(ParamSpec::optional(
                "num_results",
                ParamType::Integer,
                json!(5),
                "Number of results (default: 5)",
            ));
        Self { spec, provider }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let query = arg_str(&self.spec.name, &args, "query")?.trim();
        if query.is_empty() {
            return Err(ToolError::validation(&self.spec.name, "query must not be empty"));
        }
        let n = arg_i64(&self.spec.name, &args, "num_results")?.clamp(1, MAX_SEARCH_RESULTS) as usize;

        let mut hits = self
            .provider
            .search(query, n)
            .await
            .map_err(|e| ToolError::external("search", format!("{:#}", e)))?;
        hits.truncate(n);

        if hits.is_empty() {
            return Ok(ToolOutput::with_raw(NO_RESULTS, json!([])));
        }

        for hit in &mut hits {
            hit.title = truncate_chars(&hit.title, MAX_TITLE_CHARS);
            hit.snippet = truncate_chars(&hit.snippet, MAX_SNIPPET_CHARS);
        }

        let text = hits
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{}. **{}**\n   URL: {}\n   {}", i + 1, h.title, h.url, h.snippet))
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(ToolOutput::with_raw(text, json!(hits)))
    }
}

// ---------------------------------------------------------------------------
// fetch_url
// ---------------------------------------------------------------------------

pub struct FetchUrlTool {
    spec: ToolSpec,
    fetcher: Arc<dyn PageFetcher>,
}

impl FetchUrlTool {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        let spec = ToolSpec::new("fetch_url", "Fetch and extract content from a URL")
            .param(ParamSpec::required("url", ParamType::String, "URL to fetch"));
        Self { spec, fetcher }
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let url = arg_str(&self.spec.name, &args, "url")?.trim();
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ToolError::validation(&self.spec.name, format!("invalid url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::validation(
                &self.spec.name,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        let text = self
            .fetcher
            .fetch_text(parsed.as_str())
            .await
            .map_err(|e| ToolError::external("fetch", format!("{:#}", e)))?;

        Ok(ToolOutput::with_raw(
            format!("Content from {}:\n\n{}", url, text),
            json!({ "url": parsed.as_str(), "chars": text.chars().count() }),
        ))
    }
}
