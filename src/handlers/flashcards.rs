use axum::{Json, extract::State};
use std::sync::Arc;
use tracing::warn;
use crate::error::{ApiError, FlashcardError};
use crate::metrics::REQUEST_TOTAL;
use crate::models::{FlashcardsResponse, TextRequest};
use crate::prompts::{flashcard_prompt, parse_flashcards};
use crate::state::AppState;

const RAW_RESPONSE_PREVIEW_CHARS: usize = 200;

// Question/answer cards generated from the given text
pub async fn flashcards_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TextRequest>,
) -> Result<Json<FlashcardsResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::bad_request("text is required"));
    }

    let response = state
        .generator
        .generate(&flashcard_prompt(text), None)
        .await
        .map_err(|e| ApiError::generation("flashcard generation failed", &e))?;

    match parse_flashcards(&response) {
        Ok(cards) => Ok(Json(FlashcardsResponse { cards })),
        Err(e @ FlashcardError::Json(_)) => {
            warn!(error = %e, "Model returned unparsable flashcards");
            let raw: String = response.chars().take(RAW_RESPONSE_PREVIEW_CHARS).collect();
            Err(ApiError::bad_request("failed to parse flashcard response")
                .with_details(e.to_string())
                .with_raw_response(raw))
        }
        Err(e) => Err(ApiError::bad_request("flashcard generation failed").with_details(e.to_string())),
    }
}
