use axum::{Json, extract::State};
use std::sync::Arc;
use std::time::Instant;
use crate::error::ApiError;
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::models::{GenerateRequest, GenerateResponse};
use crate::state::AppState;

pub async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    REQUEST_TOTAL.inc();

    let prompt = payload.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::bad_request("prompt is required"));
    }
    // blank model means "use the default"
    let model = payload.model.as_deref().map(str::trim).filter(|m| !m.is_empty());

    let start_time = Instant::now();

    let output = state
        .generator
        .generate(prompt, model)
        .await
        .map_err(|e| ApiError::generation("generation failed", &e))?;

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(Json(GenerateResponse { output }))
}
