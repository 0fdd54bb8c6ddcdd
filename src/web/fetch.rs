//! Page fetching: HTTP GET plus HTML-to-text extraction.

use crate::text::{html_to_text, prefix_chars};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Lines kept from an extracted page.
pub const MAX_PAGE_LINES: usize = 150;

/// Characters kept from an extracted page.
pub const MAX_PAGE_CHARS: usize = 8000;

/// Fetches a URL and returns its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build fetch HTTP client")?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("HTTP {} for {}", status, url);
        }

        let is_html = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let body = super::read_body_capped(resp, super::MAX_BODY_BYTES).await?;
        Ok(extract_page_text(&body, is_html))
    }
}

/// Window a fetched body: HTML is converted to text, then the result is
/// limited to `MAX_PAGE_LINES` lines and `MAX_PAGE_CHARS` characters.
pub fn extract_page_text(body: &str, is_html: bool) -> String {
    let text = if is_html {
        html_to_text(body, MAX_PAGE_LINES)
    } else {
        body.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(MAX_PAGE_LINES)
            .collect::<Vec<_>>()
            .join("\n")
    };
    prefix_chars(&text, MAX_PAGE_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_windowed() {
        let body = (0..500).map(|i| format!("line {}\n\n", i)).collect::<String>();
        let text = extract_page_text(&body, false);
        assert_eq!(text.lines().count(), MAX_PAGE_LINES);
        assert!(text.starts_with("line 0\nline 1\n"));
    }

    #[test]
    fn output_is_capped_in_characters() {
        let body = format!("<p>{}</p>", "a".repeat(20_000));
        let text = extract_page_text(&body, true);
        assert_eq!(text.chars().count(), MAX_PAGE_CHARS);
    }
}
