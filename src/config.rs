use std::str::FromStr;
use std::time::Duration;

// ── Defaults ─────────────────────────────────────────────────────────────────

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const DEFAULT_FALLBACK_IMAGE_URL: &str = "https://placehold.co/800x400?text=Image";
const DEFAULT_FEEDBACK_DATABASE_URL: &str = "sqlite://feedback.db?mode=rwc";

/// Runtime configuration, read once at start-up.
///
/// Credentials stay optional here: each client checks for its own key when a
/// request actually needs it, so a missing key only fails the requests that
/// depend on that provider.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub search_base_url: String,
    pub crawl_timeout: Duration,
    pub max_page_chars: usize,
    pub max_context_chars: usize,
    pub fallback_image_url: String,
    pub trusted_image_domains: Vec<String>,
    pub strict_image_filter: bool,
    pub feedback_database_url: String,
    pub insecure_ssl: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            search_api_key: None,
            search_engine_id: None,
            search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
            crawl_timeout: Duration::from_secs(5),
            max_page_chars: 2000,
            max_context_chars: 5000,
            fallback_image_url: DEFAULT_FALLBACK_IMAGE_URL.to_string(),
            trusted_image_domains: Vec::new(),
            strict_image_filter: false,
            feedback_database_url: DEFAULT_FEEDBACK_DATABASE_URL.to_string(),
            insecure_ssl: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        Self {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            gemini_api_key: get("GOOGLE_API_KEY"),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            search_api_key: get("GOOGLE_SEARCH_API_KEY"),
            search_engine_id: get("GOOGLE_CSE_ID"),
            search_base_url: get("GOOGLE_SEARCH_BASE_URL").unwrap_or(defaults.search_base_url),
            crawl_timeout: Duration::from_secs(parse_or(
                "CRAWL_TIMEOUT_SECS",
                get("CRAWL_TIMEOUT_SECS"),
                defaults.crawl_timeout.as_secs(),
            )),
            max_page_chars: parse_or("MAX_PAGE_CHARS", get("MAX_PAGE_CHARS"), defaults.max_page_chars),
            max_context_chars: parse_or(
                "MAX_CONTEXT_CHARS",
                get("MAX_CONTEXT_CHARS"),
                defaults.max_context_chars,
            ),
            fallback_image_url: get("FALLBACK_IMAGE_URL").unwrap_or(defaults.fallback_image_url),
            trusted_image_domains: get("IMAGE_TRUSTED_DOMAINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            strict_image_filter: parse_or(
                "IMAGE_STRICT_FILTER",
                get("IMAGE_STRICT_FILTER"),
                defaults.strict_image_filter,
            ),
            feedback_database_url: get("FEEDBACK_DATABASE_URL")
                .unwrap_or(defaults.feedback_database_url),
            insecure_ssl: get("BLOG_WRITER_INSECURE_SSL").as_deref() == Some("1"),
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr,
{
    match raw {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring unparseable {}={:?}, using default", key, raw);
            default
        }),
        None => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
