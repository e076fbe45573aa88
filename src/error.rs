//! Error types for OpenMockLLM

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for mock-server operations
pub type MockResult<T> = Result<T, MockError>;

/// Main error type for the mock engine and its personas
#[derive(Error, Debug, Clone)]
pub enum MockError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        param: Option<String>,
    },

    // The prompt does not fit the configured context window.
    // Raised before any synthesis happens; client-caused.
    #[error("Context length exceeded: {tokens} > {max_context}")]
    ContextTooLong { tokens: usize, max_context: usize },

    // The caller asked for a model this process does not serve.
    #[error("The model `{0}` does not exist")]
    ModelMismatch(String),

    // Batch shape violations (TEI persona)
    #[error("Batch is empty")]
    EmptyBatch,

    #[error("Batch size {size} exceeds maximum {max}")]
    BatchTooLarge { size: usize, max: usize },

    // Authentication
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Failed to initialize tokenizer: {0}")]
    Tokenizer(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// OpenAI-compatible error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: ErrorDetail {
                message: message.to_string(),
                error_type: error_type.to_string(),
                param: None,
                code: None,
            },
        }
    }

    pub fn with_param(mut self, param: &str) -> Self {
        self.error.param = Some(param.to_string());
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.error.code = Some(code.to_string());
        self
    }
}

impl MockError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::ContextTooLong { .. } => StatusCode::BAD_REQUEST,
            Self::ModelMismatch(_) => StatusCode::NOT_FOUND,
            Self::EmptyBatch => StatusCode::BAD_REQUEST,
            Self::BatchTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            Self::Tokenizer(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            Self::Config(_) => "configuration_error",
            Self::Validation { .. } => "invalid_request_error",
            Self::ContextTooLong { .. } => "context_length_exceeded",
            Self::ModelMismatch(_) => "not_found_error",
            Self::EmptyBatch | Self::BatchTooLarge { .. } => "invalid_request_error",
            Self::AuthenticationFailed(_) => "authentication_error",
            Self::Tokenizer(_) | Self::Internal(_) => "internal_error",
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let mut response = ErrorResponse::new(self.error_type(), &self.to_string());

        if let Self::Validation { param: Some(p), .. } = self {
            response = response.with_param(p);
        }

        if let Self::ContextTooLong { .. } = self {
            response = response.with_code("context_length_exceeded");
        }

        if let Self::ModelMismatch(_) = self {
            response = response.with_code("model_not_found");
        }

        response
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_error_response());
        (status, body).into_response()
    }
}

impl From<std::io::Error> for MockError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for MockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation {
            message: err.to_string(),
            param: None,
        }
    }
}
