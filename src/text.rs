//! Small text helpers: char-safe truncation, HTML-to-text and slugs.

use regex::Regex;
use std::sync::LazyLock;

/// Keep at most `max` characters, appending `...` when something was cut.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Keep at most `max` characters without a marker.
pub fn prefix_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// -- HTML --------------------------------------------------------------------

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

/// Elements whose whole content is chrome, not page text.
static NON_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|nav|footer|header|noscript)\b[^>]*>.*?</(script|style|nav|footer|header|noscript)\s*>")
        .expect("valid regex")
});

static BLOCK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(p|div|br|li|ul|ol|tr|table|section|article|h[1-6]|blockquote|pre)\b[^>]*>")
        .expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid regex"));

static SPACES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\f\v]+").expect("valid regex"));

/// Extract readable text from an HTML document, one trimmed non-empty line
/// per block, keeping at most `max_lines` lines.
pub fn html_to_text(html: &str, max_lines: usize) -> String {
    let html = COMMENT_RE.replace_all(html, "");
    let html = NON_CONTENT_RE.replace_all(&html, "");
    let html = BLOCK_TAG_RE.replace_all(&html, "\n");
    let text = TAG_RE.replace_all(&html, " ");
    let text = decode_entities(&text);

    text.lines()
        .map(|line| SPACES_RE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strip tags from an inline HTML fragment and collapse whitespace.
pub fn inline_text(fragment: &str) -> String {
    let text = TAG_RE.replace_all(fragment, "");
    let text = decode_entities(&text);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the handful of entities that matter for readable text.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// -- Slugs -------------------------------------------------------------------

const MAX_SLUG_LEN: usize = 64;

/// Filesystem-safe slug: lowercase, whitespace to `_`, only `[a-z0-9_-]`.
pub fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.trim().chars().flat_map(char::to_lowercase) {
        let mapped = if c.is_whitespace() {
            '_'
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            continue;
        };
        if mapped == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(mapped);
    }

    let slug = slug.trim_matches('_');
    let slug = prefix_chars(slug, MAX_SLUG_LEN).trim_end_matches('_');
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug.to_string()
    }
}
