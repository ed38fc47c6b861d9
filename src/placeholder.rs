use once_cell::sync::Lazy;
use regex::Regex;

use crate::search::ImageSearch;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(placeholder\)").unwrap());

/// One `![alt](placeholder)` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Exact source text, used for literal replacement.
    pub literal: String,
    pub alt: String,
}

/// Placeholders in encounter order.
pub fn find_placeholders(post: &str) -> Vec<Placeholder> {
    PLACEHOLDER_RE
        .captures_iter(post)
        .map(|cap| Placeholder {
            literal: cap[0].to_string(),
            alt: cap[1].trim().to_string(),
        })
        .collect()
}

/// Fill every placeholder in `post`.
///
/// Each slot takes the next unused URL from `resolved`. When those run out an
/// on-demand search (alt text, else `main_topic`) gets one try before
/// `fallback_url` is used. Empty alt text becomes `main_topic`.
pub async fn substitute_placeholders(
    post: &str,
    resolved: &[String],
    main_topic: &str,
    on_demand: Option<&dyn ImageSearch>,
    fallback_url: &str,
) -> String {
    let placeholders = find_placeholders(post);
    if placeholders.is_empty() {
        return post.to_string();
    }

    let mut remaining = resolved.iter();
    let mut out = post.to_string();
    let mut used_fallback = 0usize;

    for slot in &placeholders {
        let alt = if slot.alt.is_empty() {
            main_topic.trim().to_string()
        } else {
            slot.alt.clone()
        };

        let url = match remaining.next() {
            Some(url) => url.clone(),
            None => match search_one(on_demand, &alt, main_topic).await {
                Some(url) => url,
                None => {
                    used_fallback += 1;
                    fallback_url.to_string()
                }
            },
        };

        // The first remaining occurrence is always the current slot, since
        // earlier ones were rewritten away from the sentinel.
        out = out.replacen(&slot.literal, &format!("![{}]({})", alt, url), 1);
    }

    tracing::info!(
        "filled {} image placeholders ({} with fallback)",
        placeholders.len(),
        used_fallback
    );
    out
}

async fn search_one(
    on_demand: Option<&dyn ImageSearch>,
    query: &str,
    main_topic: &str,
) -> Option<String> {
    let search = on_demand?;
    let topic = Some(main_topic).filter(|t| !t.trim().is_empty() && *t != query);
    search.search_images(query, topic).await.into_iter().next()
}
