//! Content assembly: discover URLs, crawl, generate, then illustrate.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::aggregate::aggregate_context;
use crate::config::Config;
use crate::error::AppError;
use crate::generate::Generators;
use crate::models::BlogRequest;
use crate::placeholder::{find_placeholders, substitute_placeholders};
use crate::search::{ImageSearch, WebSearch};
use crate::terms::{main_topic, TermExtractor};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub max_page_chars: usize,
    pub max_context_chars: usize,
    pub fallback_image_url: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_page_chars: config.max_page_chars,
            max_context_chars: config.max_context_chars,
            fallback_image_url: config.fallback_image_url.clone(),
        }
    }
}

/// Every collaborator a request needs, built once at start-up.
#[derive(Clone)]
pub struct BlogPipeline {
    pub crawl_client: reqwest::Client,
    pub web_search: Arc<dyn WebSearch>,
    pub image_search: Arc<dyn ImageSearch>,
    pub generators: Generators,
    pub terms: Arc<dyn TermExtractor>,
    pub settings: PipelineSettings,
}

impl BlogPipeline {
    /// Produce the final markdown post for a validated request.
    pub async fn run(&self, request: &BlogRequest) -> Result<String, AppError> {
        let generator = self.generators.for_choice(&request.model);
        generator.ensure_configured()?;

        let urls = if request.urls.is_empty() {
            self.web_search.search(&request.topic).await?
        } else {
            request.urls.clone()
        };

        let context = aggregate_context(
            &self.crawl_client,
            &urls,
            self.settings.max_page_chars,
            self.settings.max_context_chars,
        )
        .await;
        if context.is_empty() {
            return Err(AppError::NoContent);
        }
        tracing::info!(
            "aggregated {} chars of context from {} urls",
            context.chars().count(),
            urls.len()
        );

        let post = generator
            .generate(request.model.model_name(), &request.topic, &context)
            .await?;

        Ok(self.illustrate(&post, &request.topic).await)
    }

    /// Resolve images for every placeholder in `post`.
    pub async fn illustrate(&self, post: &str, topic: &str) -> String {
        let slots = find_placeholders(post).len();
        if slots == 0 {
            return post.to_string();
        }

        let topic = main_topic(topic, post);
        let terms = self.terms.extract(post, &topic);
        tracing::debug!("image search terms: {:?}", terms);

        let results = join_all(terms.iter().map(|term| {
            let bias = Some(topic.as_str()).filter(|t| *t != term.as_str());
            self.image_search.search_images(term, bias)
        }))
        .await;

        let candidates = dedupe_candidates(results, post);
        tracing::info!("{} image candidates for {} placeholders", candidates.len(), slots);

        substitute_placeholders(
            post,
            &candidates,
            &topic,
            Some(self.image_search.as_ref()),
            &self.settings.fallback_image_url,
        )
        .await
    }
}

/// Flatten per-term results in term order, dropping repeats and URLs the
/// post already shows.
fn dedupe_candidates(results: Vec<Vec<String>>, post: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .flatten()
        .filter(|url| !post.contains(url.as_str()))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_keeps_first_occurrence_in_term_order() {
        let results = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["b".to_string(), "c".to_string()],
            vec![],
        ];
        assert_eq!(dedupe_candidates(results, "post"), vec!["a", "b", "c"]);
    }

    #[test]
    fn dedupe_skips_images_already_in_post() {
        let results = vec![vec![
            "https://img/1.png".to_string(),
            "https://img/2.png".to_string(),
        ]];
        let post = "![x](https://img/1.png) ![y](placeholder)";
        assert_eq!(dedupe_candidates(results, post), vec!["https://img/2.png"]);
    }
}
