use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::feedback::FeedbackError;
use crate::generate::{GenerationError, GENERATION_FAILED};
use crate::models::ErrorBody;
use crate::search::SearchError;

/// Every way a request can fail, rendered as `{ "error", "details" }`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidRequest {
        message: String,
        field: Option<&'static str>,
    },
    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("{0}")]
    Config(String),
    #[error("No usable content found for this request")]
    NoContent,
    #[error("{message}")]
    Generation { message: String, details: Value },
    #[error("{message}")]
    Search { message: String, details: Value },
    #[error("{0}")]
    Storage(String),
}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. } | AppError::UnsupportedModel(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NoContent => StatusCode::NOT_FOUND,
            AppError::Search { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Generation { .. } | AppError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Value {
        match self {
            AppError::InvalidRequest {
                field: Some(field), ..
            } => json!({ "field": field }),
            AppError::UnsupportedModel(_) => {
                json!({ "supported": ["gpt-3.5-turbo", "gpt-4", "gpt-4-turbo", "gemini-pro"] })
            }
            AppError::Generation { details, .. } | AppError::Search { details, .. } => {
                details.clone()
            }
            _ => json!({}),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::warn!("request rejected: {}", self);
        }
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::NotConfigured(message) => AppError::Config(message),
            GenerationError::Failed {
                provider,
                message,
                details,
            } => {
                tracing::error!("{} generation failed: {}", provider, message);
                AppError::Generation {
                    message: GENERATION_FAILED.to_string(),
                    details,
                }
            }
        }
    }
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::NotConfigured(message) => AppError::Config(message),
            other => AppError::Search {
                message: format!("Web search failed: {}", other),
                details: other.details(),
            },
        }
    }
}

impl From<FeedbackError> for AppError {
    fn from(e: FeedbackError) -> Self {
        AppError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::invalid("prompt", "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::UnsupportedModel("claude".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Config("k".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::NoContent.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Search {
                message: "s".into(),
                details: json!({})
            }
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn generation_failures_get_the_generic_message() {
        let err: AppError = GenerationError::Failed {
            provider: "gemini",
            message: "HTTP 500".into(),
            details: json!({"status": 500}),
        }
        .into();
        assert_eq!(err.to_string(), GENERATION_FAILED);
        assert_eq!(err.details()["status"], 500);
    }

    #[test]
    fn missing_credentials_become_config_errors() {
        let err: AppError = GenerationError::NotConfigured("OpenAI API key not configured".into()).into();
        assert!(matches!(err, AppError::Config(_)));

        let err: AppError = SearchError::NotConfigured("no key".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_request_details_name_the_field() {
        let err = AppError::invalid("prompt", "Invalid or missing prompt");
        assert_eq!(err.details(), json!({"field": "prompt"}));
    }
}
