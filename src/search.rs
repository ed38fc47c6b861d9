//! Google Custom Search clients for web pages and images.
//!
//! Web search is a hard dependency of the pipeline and propagates failures.
//! Image search is best-effort: provider errors degrade to an empty list.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;

// ── Constants ────────────────────────────────────────────────────────────────

const WEB_RESULT_COUNT: u8 = 5;
const IMAGE_RESULT_COUNT: u8 = 3;
const IMAGE_RIGHTS: &str = "cc_publicdomain,cc_attribute,cc_sharealike";
const IMAGE_QUERY_SUFFIX: &str = "infographic diagram chart illustration";
const MAX_IMAGE_QUERY_CHARS: usize = 120;

const QUERY_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it",
    "of", "on", "or", "that", "the", "this", "to", "was", "what", "why", "with",
];

const DISALLOWED_IMAGE_TERMS: &[&str] = &["logo", "icon", "avatar", "sprite"];

static IMAGE_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|gif|webp|svg)$").unwrap());

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    NotConfigured(String),
    #[error("search request failed: {0}")]
    Request(String),
    #[error("search API returned HTTP {status}")]
    Status { status: u16, body: Value },
    #[error("search response could not be parsed: {0}")]
    Parse(String),
}

impl SearchError {
    /// Provider payload worth surfacing to the caller, if any.
    pub fn details(&self) -> Value {
        match self {
            SearchError::Status { status, body } => {
                serde_json::json!({ "status": status, "response": body })
            }
            _ => serde_json::json!({}),
        }
    }
}

// ── Traits ───────────────────────────────────────────────────────────────────

/// Ranked web result URLs for a free-text query.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;
}

/// Candidate image URLs for a query, optionally biased by the main topic.
///
/// Never fails; an unavailable provider yields no candidates.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search_images(&self, query: &str, topic: Option<&str>) -> Vec<String>;
}

// ── Filtering ────────────────────────────────────────────────────────────────

/// Post-filter applied to image results.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    pub trusted_domains: Vec<String>,
    pub strict: bool,
}

impl ImageFilter {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trusted_domains: config.trusted_image_domains.clone(),
            strict: config.strict_image_filter,
        }
    }

    /// Whether `url` survives the strict checks. Always true when not strict.
    pub fn accepts(&self, url: &str) -> bool {
        if !self.strict {
            return true;
        }
        let lower = url.to_lowercase();
        if DISALLOWED_IMAGE_TERMS.iter().any(|t| lower.contains(t)) {
            return false;
        }
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or("").to_string());
        IMAGE_EXTENSION_RE.is_match(&path)
    }

    /// Restrict a query to the trusted domains, if any are configured.
    fn scope_query(&self, query: &str) -> String {
        if self.trusted_domains.is_empty() {
            return query.to_string();
        }
        let sites = self
            .trusted_domains
            .iter()
            .map(|d| format!("site:{}", d))
            .collect::<Vec<_>>()
            .join(" OR ");
        format!("{} ({})", query, sites)
    }
}

/// Combine topic and query into one image search phrase.
///
/// Stop-words and repeated words are dropped and the result is capped on a
/// word boundary.
pub fn build_image_query(query: &str, topic: Option<&str>) -> String {
    let raw = match topic.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => format!("{} {} {}", topic, query, IMAGE_QUERY_SUFFIX),
        None => format!("{} {}", query, IMAGE_QUERY_SUFFIX),
    };

    let mut seen = std::collections::HashSet::new();
    let mut out = String::new();
    for word in raw.split_whitespace() {
        let key = word.to_lowercase();
        if QUERY_STOP_WORDS.contains(&key.as_str()) || !seen.insert(key) {
            continue;
        }
        let extra = if out.is_empty() { word.len() } else { word.len() + 1 };
        if out.len() + extra > MAX_IMAGE_QUERY_CHARS {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

// ── Google Custom Search ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

#[derive(Debug, Clone)]
pub struct GoogleSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    engine_id: Option<String>,
    filter: ImageFilter,
}

impl GoogleSearchClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
        engine_id: Option<String>,
        filter: ImageFilter,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
            engine_id,
            filter,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            config.search_base_url.clone(),
            config.search_api_key.clone(),
            config.search_engine_id.clone(),
            ImageFilter::from_config(config),
        )
    }

    fn credentials(&self) -> Result<(&str, &str), SearchError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            SearchError::NotConfigured("Google search API key not configured".to_string())
        })?;
        let cx = self.engine_id.as_deref().ok_or_else(|| {
            SearchError::NotConfigured("Google custom search engine ID not configured".to_string())
        })?;
        Ok((key, cx))
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Vec<String>, SearchError> {
        let (key, cx) = self.credentials()?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("key", key), ("cx", cx)])
            .query(params)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .json::<Value>()
                .await
                .unwrap_or_else(|_| serde_json::json!({}));
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(e.to_string()))?;
        Ok(data.items.into_iter().map(|item| item.link).collect())
    }
}

#[async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let num = WEB_RESULT_COUNT.to_string();
        let links = self
            .query(&[("q", query), ("num", &num), ("lr", "lang_en")])
            .await?;
        tracing::info!("web search for {:?} returned {} links", query, links.len());
        Ok(links)
    }
}

#[async_trait]
impl ImageSearch for GoogleSearchClient {
    async fn search_images(&self, query: &str, topic: Option<&str>) -> Vec<String> {
        let q = self.filter.scope_query(&build_image_query(query, topic));
        let num = IMAGE_RESULT_COUNT.to_string();
        let params = [
            ("q", q.as_str()),
            ("searchType", "image"),
            ("num", num.as_str()),
            ("rights", IMAGE_RIGHTS),
            ("imgType", "photo"),
            ("safe", "active"),
        ];

        match self.query(&params).await {
            Ok(links) => {
                let kept: Vec<String> = links
                    .into_iter()
                    .filter(|link| self.filter.accepts(link))
                    .collect();
                tracing::debug!("image search for {:?} kept {} candidates", q, kept.len());
                kept
            }
            Err(e) => {
                tracing::warn!("image search for {:?} failed: {}", q, e);
                Vec::new()
            }
        }
    }
}
