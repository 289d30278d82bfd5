use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::path::PathBuf;

// Failures of the upstream text generation call. Never cached.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("prompt must be a non-empty string")]
    EmptyPrompt,

    #[error("generation is not configured: {0}")]
    NotConfigured(String),

    #[error("request to generation API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("generation API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("invalid response from generation API: {0}")]
    InvalidResponse(String),

    #[error("empty response from generation API")]
    EmptyResponse,
}

impl GenerationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GenerationError::EmptyPrompt => StatusCode::BAD_REQUEST,
            GenerationError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("file path must be a non-empty string")]
    InvalidPath,

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: {0:?}. Only .txt and .pdf are supported")]
    UnsupportedExtension(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse PDF: {0}")]
    Pdf(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FlashcardError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response is not a list")]
    NotAList,

    #[error("no valid flashcards generated")]
    Empty,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

// Error returned from handlers, rendered as a JSON body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
                raw_response: None,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }

    // `error` names the operation, the generation error goes into details
    pub fn generation(error: impl Into<String>, source: &GenerationError) -> Self {
        Self::new(source.status_code(), error).with_details(source.to_string())
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn with_raw_response(mut self, raw: impl Into<String>) -> Self {
        self.body.raw_response = Some(raw.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
