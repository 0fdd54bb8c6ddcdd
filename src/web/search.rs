//! Web search via the DuckDuckGo HTML endpoint (no API key needed).

use crate::text::inline_text;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// External search provider.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo HTML search client.
#[derive(Debug, Clone)]
pub struct DuckDuckGo {
    base_url: String,
    http: reqwest::Client,
}

impl DuckDuckGo {
    pub const DEFAULT_URL: &'static str = "https://html.duckduckgo.com/html/";

    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build search HTTP client")?;
        Ok(Self {
            base_url: base_url.to_string(),
            http,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        debug!("DuckDuckGo search: {}", query);

        let resp = self
            .http
            .post(&self.base_url)
            .form(&[("q", query)])
            .send()
            .await
            .context("Search request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = super::read_body_capped(resp, 4096).await.unwrap_or_default();
            bail!("Search failed ({}): {}", status, crate::text::truncate_chars(&body, 200));
        }

        let html = super::read_body_capped(resp, super::MAX_BODY_BYTES)
            .await
            .context("Failed to read search response")?;
        let hits = parse_results(&html, max_results);
        debug!("DuckDuckGo returned {} hits", hits.len());
        Ok(hits)
    }
}

// ---------------------------------------------------------------------------
// Result page parsing
// ---------------------------------------------------------------------------

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a[^>]*class="[^"]*result__a[^"]*"[^>]*href="([^"]+)"[^>]*>(.*?)</a>"#)
        .expect("valid regex")
});

static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<(?:a|div|td)[^>]*class="[^"]*result__snippet[^"]*"[^>]*>(.*?)</(?:a|div|td)>"#)
        .expect("valid regex")
});

/// Extract up to `max_results` hits from a DuckDuckGo HTML result page.
///
/// Each title link is paired with the first snippet that appears before the
/// next title link. Ads and internal DuckDuckGo links are skipped.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchHit> {
    let titles: Vec<_> = TITLE_RE.captures_iter(html).collect();
    let snippets: Vec<(usize, String)> = SNIPPET_RE
        .captures_iter(html)
        .filter_map(|c| Some((c.get(0)?.start(), inline_text(c.get(1)?.as_str()))))
        .collect();

    let mut hits = Vec::new();
    for (i, caps) in titles.iter().enumerate() {
        if hits.len() >= max_results {
            break;
        }
        let (Some(whole), Some(href), Some(title)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let Some(url) = resolve_href(href.as_str()) else {
            continue;
        };
        let title = inline_text(title.as_str());
        if title.is_empty() {
            continue;
        }

        let window_end = titles
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(html.len());
        let snippet = snippets
            .iter()
            .find(|(pos, _)| *pos >= whole.end() && *pos < window_end)
            .map(|(_, text)| text.clone())
            .unwrap_or_default();

        hits.push(SearchHit { title, url, snippet });
    }
    hits
}

/// Turn a result href into the target URL, unwrapping `/l/?uddg=` redirects.
fn resolve_href(href: &str) -> Option<String> {
    let href = crate::text::decode_entities(href);

    let url = if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        urlencoding::decode(encoded).ok()?.into_owned()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        href
    };

    let is_http = url.starts_with("http://") || url.starts_with("https://");
    if !is_http || url.contains("duckduckgo.com/") {
        return None;
    }
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<div class="result results_links results_links_deep result--ad">
  <a rel="nofollow" class="result__a" href="https://duckduckgo.com/y.js?ad_provider=x">Sponsored</a>
  <a class="result__snippet" href="#">Buy now</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fcoralprotocol.org%2F&amp;rut=abc">Coral <b>Protocol</b></a>
  </h2>
  <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">An open &amp; <b>decentralized</b> agent network.</a>
</div>
<div class="result results_links results_links_deep web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="https://example.com/agents">Agents overview</a>
  </h2>
</div>
<div class="result results_links results_links_deep web-result">
  <a rel="nofollow" class="result__a" href="https://example.org/third">Third</a>
  <a class="result__snippet" href="https://example.org/third">Third snippet</a>
</div>
"##;

    #[test]
    fn parses_titles_urls_and_snippets() {
        let hits = parse_results(PAGE, 10);
        assert_eq!(hits.len(), 3);

        assert_eq!(hits[0].title, "Coral Protocol");
        assert_eq!(hits[0].url, "https://coralprotocol.org/");
        assert_eq!(hits[0].snippet, "An open & decentralized agent network.");

        // No snippet of its own: must not borrow the next result's snippet.
        assert_eq!(hits[1].url, "https://example.com/agents");
        assert_eq!(hits[1].snippet, "");

        assert_eq!(hits[2].snippet, "Third snippet");
    }

    #[test]
    fn respects_max_results() {
        assert_eq!(parse_results(PAGE, 1).len(), 1);
        assert!(parse_results("<html>no results</html>", 5).is_empty());
    }

    #[test]
    fn resolves_redirect_hrefs() {
        assert_eq!(
            resolve_href("/l/?kh=-1&uddg=https%3A%2F%2Frust-lang.org%2Flearn").as_deref(),
            Some("https://rust-lang.org/learn")
        );
        assert_eq!(resolve_href("//example.com/x").as_deref(), Some("https://example.com/x"));
        assert_eq!(resolve_href("javascript:void(0)"), None);
    }
}
