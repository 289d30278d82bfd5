use axum::{Json, response::IntoResponse};

// health handler
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn hello_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Hello from EduBot!",
        "status": "success"
    }))
}
