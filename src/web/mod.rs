pub mod fetch;
pub mod search;

pub use fetch::{HttpFetcher, PageFetcher};
pub use search::{DuckDuckGo, SearchHit, SearchProvider};

use anyhow::{Context, Result};
use tracing::debug;

/// Browser-like user agent; some sites refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Bytes downloaded from a page or result list before the rest is dropped.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Read at most `limit` bytes of a response body as text.
///
/// The download stops once the limit is reached, so an oversized page costs
/// `limit` bytes rather than its full length.
pub async fn read_body_capped(mut resp: reqwest::Response, limit: usize) -> Result<String> {
    if let Some(len) = resp.content_length().filter(|&len| len > limit as u64) {
        debug!("Body of {} bytes will be cut at {}", len, limit);
    }

    let mut buf = Vec::new();
    while let Some(chunk) = resp.chunk().await.context("Failed to read response body")? {
        if !push_capped(&mut buf, &chunk, limit) {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Append as much of `chunk` as fits; false once `buf` is full.
fn push_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() < limit
}
