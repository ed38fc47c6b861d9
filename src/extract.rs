use std::time::Duration;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "blog-writer-api/1.0";

/// Subtrees that never carry article text.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "footer", "header", "iframe", "frame", "frameset",
    "object", "embed", "svg", "template",
];

/// Candidate containers, most specific first.
const CONTAINER_TAGS: &[&str] = &["article", "main", "body"];

static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTAINER_TAGS
        .iter()
        .filter_map(|tag| Selector::parse(tag).ok())
        .collect()
});

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("URL did not return HTML ({0})")]
    NotHtml(String),
    #[error("upstream returned HTTP {0}")]
    Upstream(u16),
    #[error("{0}")]
    Request(String),
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Build the HTTP client used for page crawling.
///
/// The timeout bounds every page fetch; a hung site costs at most this long.
pub fn crawl_client(timeout: Duration, insecure: bool) -> reqwest::Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        reqwest::header::HeaderValue::from_static("en-US,en;q=0.9"),
    );

    let mut builder = reqwest::ClientBuilder::new()
        .connect_timeout(timeout)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if insecure {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build()
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Fetch `url` and return its main text, capped at `max_chars` characters.
///
/// Never fails: any network, status or parse problem yields an empty string.
pub async fn extract_text(client: &reqwest::Client, url: &str, max_chars: usize) -> String {
    match fetch_html(client, url).await {
        Ok(html) => {
            let text = extract_from_html(&html, max_chars);
            tracing::debug!("extracted {} chars from {}", text.chars().count(), url);
            text
        }
        Err(e) => {
            tracing::warn!("failed to crawl {}: {}", url, e);
            String::new()
        }
    }
}

// ── URL validation ───────────────────────────────────────────────────────────

fn validate_url(url: &str) -> Result<Url, ExtractionError> {
    let parsed =
        Url::parse(url.trim()).map_err(|_| ExtractionError::InvalidUrl(format!("invalid URL: {}", url)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ExtractionError::InvalidUrl(format!(
            "unsupported scheme {:?} in {}",
            other, url
        ))),
    }
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, ExtractionError> {
    let url = validate_url(url)?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ExtractionError::Request(format!("TimeoutError: {}", e))
        } else if e.is_connect() {
            ExtractionError::Request(format!("ConnectError: {}", e))
        } else {
            ExtractionError::Request(format!("RequestError: {}", e))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ExtractionError::Upstream(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml+xml") {
        return Err(ExtractionError::NotHtml(content_type));
    }

    response
        .text()
        .await
        .map_err(|e| ExtractionError::Request(e.to_string()))
}

// ── Text extraction ──────────────────────────────────────────────────────────

/// Pull readable text out of an HTML document.
///
/// The first of `article`, `main`, `body` that yields any text wins. Chrome
/// (scripts, styles, navigation, headers, footers, frames) is skipped.
pub fn extract_from_html(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    for selector in CONTAINER_SELECTORS.iter() {
        for container in document.select(selector) {
            let text = normalize_text(&collect_text(container));
            if !text.is_empty() {
                return truncate_chars(&text, max_chars);
            }
        }
    }

    String::new()
}

/// Recursively collect text, skipping non-content subtrees.
fn collect_text(el: ElementRef<'_>) -> String {
    use scraper::node::Node;
    let mut out = String::new();
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&*text.text),
            Node::Element(element) => {
                if SKIP_TAGS.contains(&element.name()) {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    // Keep words from adjacent blocks apart.
                    out.push(' ');
                    out.push_str(&collect_text(child_el));
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
    out
}

/// Collapse whitespace runs to single spaces and trim.
fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap `text` at `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
