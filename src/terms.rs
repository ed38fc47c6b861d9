//! Keyword extraction for image queries.
//!
//! A frequency heuristic over capitalised phrases and long words. Callers go
//! through [`TermExtractor`] so a smarter strategy can slot in later.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

const MIN_WORD_LEN: usize = 5;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "among", "based", "because", "before", "being",
    "below", "between", "could", "conclusion", "different", "during", "every", "first",
    "however", "image", "introduction", "other", "placeholder", "really", "should", "since",
    "their", "there", "these", "thing", "things", "those", "through", "under", "until",
    "using", "where", "which", "while", "would", "your", "yours",
];

/// Capitalised only because they open a sentence; never the start of a phrase.
const LEADING_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "but", "by", "for", "from", "how", "if", "in", "is",
    "it", "its", "of", "on", "or", "our", "that", "the", "they", "this", "to", "we", "what",
    "when", "why", "with",
];

static IMAGE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());

static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#*_`>|~]+").unwrap());

static PHRASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z][A-Za-z-]+\b").unwrap());

/// Ranked candidate search phrases for a piece of text.
pub trait TermExtractor: Send + Sync {
    fn extract(&self, text: &str, main_topic: &str) -> Vec<String>;
}

/// Picks the most frequent phrases and words.
#[derive(Debug, Clone)]
pub struct FrequencyTermExtractor {
    pub max_terms: usize,
    /// Put the main topic first regardless of its frequency.
    pub include_topic: bool,
}

impl Default for FrequencyTermExtractor {
    fn default() -> Self {
        Self {
            max_terms: 3,
            include_topic: true,
        }
    }
}

impl TermExtractor for FrequencyTermExtractor {
    fn extract(&self, text: &str, main_topic: &str) -> Vec<String> {
        let plain = strip_markdown(text);

        // term -> (count, first position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut bump = |term: String, pos: usize| {
            let entry = counts.entry(term).or_insert((0, pos));
            entry.0 += 1;
        };

        for m in PHRASE_RE.find_iter(&plain) {
            let words: Vec<&str> = m
                .as_str()
                .split_whitespace()
                .skip_while(|w| is_function_word(w))
                .collect();
            if words.len() < 2 {
                continue;
            }
            bump(words.join(" "), m.start());
        }

        for m in WORD_RE.find_iter(&plain) {
            let word = m.as_str().to_lowercase();
            if word.len() < MIN_WORD_LEN || STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            bump(word, m.start());
        }

        let mut ranked: Vec<(String, usize, usize)> = counts
            .into_iter()
            .map(|(term, (count, pos))| (term, count, pos))
            .collect();
        // Most frequent first; earlier, then longer, terms win ties.
        ranked.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(a.2.cmp(&b.2))
                .then(b.0.len().cmp(&a.0.len()))
                .then(a.0.cmp(&b.0))
        });

        let topic = main_topic.trim();
        let topic_words: Vec<&str> = topic.split_whitespace().collect();
        let mut terms: Vec<String> = Vec::with_capacity(self.max_terms);
        if self.include_topic && !topic.is_empty() {
            terms.push(topic.to_string());
        }
        for (term, _, _) in ranked {
            if terms.len() >= self.max_terms {
                break;
            }
            if terms.iter().any(|t| t.eq_ignore_ascii_case(&term)) || covered_by(&topic_words, &term) {
                continue;
            }
            terms.push(term);
        }
        terms.truncate(self.max_terms);
        terms
    }
}

fn is_function_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    LEADING_WORDS.contains(&lower.as_str()) || STOP_WORDS.contains(&lower.as_str())
}

/// Every word of `term` already appears in the topic.
fn covered_by(topic_words: &[&str], term: &str) -> bool {
    !topic_words.is_empty()
        && term
            .split_whitespace()
            .all(|w| topic_words.iter().any(|t| t.eq_ignore_ascii_case(w)))
}

/// Derive the main topic: the request topic, else the post's first line.
pub fn main_topic(request_topic: &str, post: &str) -> String {
    let topic = request_topic.trim();
    if !topic.is_empty() {
        return topic.to_string();
    }
    post.lines()
        .map(|l| strip_markdown(l).trim().to_string())
        .find(|l| !l.is_empty())
        .map(|l| {
            let sentence = l.split(['.', '!', '?']).next().unwrap_or("").trim();
            sentence.split_whitespace().take(8).collect::<Vec<_>>().join(" ")
        })
        .unwrap_or_default()
}

fn strip_markdown(text: &str) -> String {
    let no_images = IMAGE_TAG_RE.replace_all(text, " ");
    let no_links = LINK_RE.replace_all(&no_images, "$1");
    MARKUP_RE.replace_all(&no_links, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "# Solar Power Today\n\n\
        Solar panels convert sunlight. Panels are cheap and panels last.\n\n\
        ![Rooftop array](placeholder)\n\n\
        The Grid Operator buys power. The Grid Operator sells power back. Storage batteries help.\n";

    #[test]
    fn topic_comes_first_then_frequency() {
        let extractor = FrequencyTermExtractor::default();
        let terms = extractor.extract(POST, "Solar Power");
        assert_eq!(terms, vec!["Solar Power", "panels", "Grid Operator"]);
    }

    #[test]
    fn sentence_openers_are_not_part_of_phrases() {
        let extractor = FrequencyTermExtractor {
            max_terms: 5,
            include_topic: false,
        };
        let terms = extractor.extract(
            "The Grid Operator buys power. The Grid Operator sells. In Berlin it rains.",
            "",
        );
        assert_eq!(terms[0], "Grid Operator");
        assert!(terms.iter().all(|t| !t.starts_with("The ") && !t.starts_with("In ")));
    }

    #[test]
    fn words_already_in_the_topic_are_skipped() {
        let extractor = FrequencyTermExtractor::default();
        let terms = extractor.extract("Wind power. Wind power. Wind power. Turbines spin.", "Wind Power");
        assert_eq!(terms, vec!["Wind Power", "turbines"]);
    }

    #[test]
    fn without_topic_ranks_phrases_and_words() {
        let extractor = FrequencyTermExtractor {
            max_terms: 2,
            include_topic: false,
        };
        let terms = extractor.extract(POST, "");
        assert_eq!(terms, vec!["power", "panels"]);
    }

    #[test]
    fn capitalised_phrases_are_candidates() {
        let extractor = FrequencyTermExtractor {
            max_terms: 1,
            include_topic: false,
        };
        let text = "Machine Learning helps. Machine Learning scales. Machine Learning rules.";
        assert_eq!(extractor.extract(text, ""), vec!["Machine Learning"]);
    }

    #[test]
    fn ignores_placeholder_markup_and_stop_words() {
        let extractor = FrequencyTermExtractor {
            max_terms: 5,
            include_topic: false,
        };
        let terms = extractor.extract("![placeholder image](placeholder) which which which", "");
        assert!(terms.is_empty());
    }

    #[test]
    fn main_topic_prefers_request() {
        assert_eq!(main_topic("  Solar Power ", POST), "Solar Power");
        assert_eq!(main_topic("", POST), "Solar Power Today");
        assert_eq!(main_topic("", "\n\nWind is cheap. Really."), "Wind is cheap");
        assert_eq!(main_topic("", ""), "");
    }
}
