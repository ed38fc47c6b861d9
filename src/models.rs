use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::generate::ModelChoice;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default, alias = "topic")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub model: Option<String>,
}

/// A generation request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogRequest {
    pub topic: String,
    pub urls: Vec<String>,
    pub model: ModelChoice,
}

impl GenerateRequest {
    pub fn validate(self) -> Result<BlogRequest, AppError> {
        let topic = self
            .prompt
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::invalid("prompt", "Invalid or missing prompt"))?;

        let selector = self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model = ModelChoice::from_selector(&selector)
            .ok_or_else(|| AppError::UnsupportedModel(selector.clone()))?;

        let urls = self
            .urls
            .unwrap_or_default()
            .into_iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();

        Ok(BlogRequest { topic, urls, model })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub relevant: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: Value,
}
