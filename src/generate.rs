//! Blog post generation against two interchangeable LLM providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;

const MAX_OUTPUT_TOKENS: u32 = 2000;
const TEMPERATURE: f64 = 0.7;
const GEMINI_MODEL: &str = "gemini-pro";
const OPENAI_PREFIX: &str = "gpt";

pub const GENERATION_FAILED: &str = "Content generation failed. Please try a different query.";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    NotConfigured(String),
    #[error("{provider} request failed: {message}")]
    Failed {
        provider: &'static str,
        message: String,
        details: Value,
    },
}

impl GenerationError {
    fn failed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            provider,
            message: message.into(),
            details: serde_json::json!({}),
        }
    }
}

// ── Model selection ──────────────────────────────────────────────────────────

/// Which provider serves a request, decided once from the model selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    OpenAi(String),
    Gemini,
}

impl ModelChoice {
    /// `gpt*` selects OpenAI with that model name; `gemini-pro` selects Gemini.
    pub fn from_selector(selector: &str) -> Option<Self> {
        let selector = selector.trim();
        if selector.starts_with(OPENAI_PREFIX) {
            Some(Self::OpenAi(selector.to_string()))
        } else if selector == GEMINI_MODEL {
            Some(Self::Gemini)
        } else {
            None
        }
    }

    pub fn model_name(&self) -> &str {
        match self {
            Self::OpenAi(model) => model,
            Self::Gemini => GEMINI_MODEL,
        }
    }
}

// ── Provider trait ───────────────────────────────────────────────────────────

#[async_trait]
pub trait Generator: Send + Sync {
    /// Fail fast when the provider cannot be called at all.
    fn ensure_configured(&self) -> Result<(), GenerationError> {
        Ok(())
    }

    /// Draft a markdown post on `topic`, grounded in `context`.
    async fn generate(
        &self,
        model: &str,
        topic: &str,
        context: &str,
    ) -> Result<String, GenerationError>;
}

/// One client per provider, constructed at start-up.
#[derive(Clone)]
pub struct Generators {
    pub openai: std::sync::Arc<dyn Generator>,
    pub gemini: std::sync::Arc<dyn Generator>,
}

impl Generators {
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self {
            openai: std::sync::Arc::new(OpenAiClient::new(
                client.clone(),
                config.openai_base_url.clone(),
                config.openai_api_key.clone(),
            )),
            gemini: std::sync::Arc::new(GeminiClient::new(
                client,
                config.gemini_base_url.clone(),
                config.gemini_api_key.clone(),
            )),
        }
    }

    pub fn for_choice(&self, choice: &ModelChoice) -> &dyn Generator {
        match choice {
            ModelChoice::OpenAi(_) => self.openai.as_ref(),
            ModelChoice::Gemini => self.gemini.as_ref(),
        }
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

const POST_REQUIREMENTS: &str = "Requirements:
- Use markdown formatting for the entire post
- Start with a title, then an introduction, body sections with headings, and a conclusion
- Include 2-4 image placeholders using exactly this syntax: ![Description](placeholder)
- Place images between logical content sections
- Give every image a different, descriptive alt text
- Maintain a neutral, professional tone";

/// System instruction with the context embedded.
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a professional blog writer. Use the context to create a blog post with images.\n\n\
         Context:\n{}\n\n{}",
        context, POST_REQUIREMENTS
    )
}

// ── OpenAI ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured("OpenAI API key not configured".to_string()))
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    fn ensure_configured(&self) -> Result<(), GenerationError> {
        self.api_key().map(|_| ())
    }

    async fn generate(
        &self,
        model: &str,
        topic: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;

        let system = system_prompt(context);
        let request = ChatCompletionsRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: topic,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_OUTPUT_TOKENS,
        };

        tracing::info!("requesting {} completion for {:?}", model, topic);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::failed("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(provider_status_error("openai", status, response).await);
        }

        let parsed: ChatCompletionsResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::failed("openai", e.to_string()))?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

// ── Gemini ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

const GEMINI_INSTRUCTIONS: &str = "You are a professional blog writer. Follow these rules:
- Use markdown formatting
- Start with a title, then an introduction, body sections with headings, and a conclusion
- Include 2-4 image placeholders: ![Description](placeholder)
- Place images between content sections
- Use different descriptive alt texts
- Maintain neutral, professional tone";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GenerationError::NotConfigured("Google API key not configured".to_string()))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    fn ensure_configured(&self) -> Result<(), GenerationError> {
        self.api_key().map(|_| ())
    }

    async fn generate(
        &self,
        model: &str,
        topic: &str,
        context: &str,
    ) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: GEMINI_INSTRUCTIONS.to_string(),
                    },
                    Part {
                        text: format!("Context: {}", context),
                    },
                    Part {
                        text: format!("User Query: {}", topic),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                temperature: TEMPERATURE,
            },
        };

        tracing::info!("requesting {} content for {:?}", model, topic);
        let response = self
            .client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::failed("gemini", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(provider_status_error("gemini", status, response).await);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::failed("gemini", e.to_string()))?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

async fn provider_status_error(
    provider: &'static str,
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> GenerationError {
    let body = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| serde_json::json!({}));
    tracing::error!("{} returned HTTP {}: {}", provider, status, body);
    GenerationError::Failed {
        provider,
        message: format!("HTTP {}", status.as_u16()),
        details: serde_json::json!({ "status": status.as_u16(), "response": body }),
    }
}
