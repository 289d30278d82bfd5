use prometheus::{Encoder, TextEncoder};
use crate::error::ApiError;

// Prometheus text exposition of everything in the default registry
pub async fn metrics_handler() -> Result<String, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::internal("failed to encode metrics").with_details(e.to_string()))?;
    String::from_utf8(buffer)
        .map_err(|e| ApiError::internal("failed to encode metrics").with_details(e.to_string()))
}
