use axum::{Json, extract::State};
use std::sync::Arc;
use crate::error::ApiError;
use crate::metrics::REQUEST_TOTAL;
use crate::models::{SummaryResponse, TextRequest};
use crate::prompts::summarize_prompt;
use crate::state::AppState;

// Bulleted summary of the given text, generated with the default model
pub async fn summarize_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("text is required"));
    }

    let summary = state
        .generator
        .generate(&summarize_prompt(text), None)
        .await
        .map_err(|e| ApiError::generation("summarization failed", &e))?;

    Ok(Json(SummaryResponse { summary }))
}
