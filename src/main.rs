mod cache;
mod config;
mod error;
mod extract;
mod generator;
mod handlers;
mod metrics;
mod models;
mod prompts;
mod state;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use crate::cache::GenerationCache;
use crate::config::Args;
use crate::generator::{CachedGenerator, GeminiClient};
use crate::handlers::{
    flashcards_handler, generate_handler, health_handler, hello_handler, metrics_handler,
    summarize_handler, upload_handler,
};
use crate::state::AppState;

fn app(state: Arc<AppState>, max_content_length: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/hello", get(hello_handler))
        .route("/api/ai/generate", post(generate_handler))
        .route("/api/ai/summarize", post(summarize_handler))
        .route("/api/ai/flashcards", post(flashcards_handler))
        .route("/api/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(max_content_length))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // a missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.request_timeout))
        .build()?;
    let gemini = GeminiClient::new(client, args.gemini_api_key.clone(), &args.gemini_base_url, &args.model);
    if !gemini.is_configured() {
        warn!("GEMINI_API_KEY is not set, generation requests will fail until it is");
    }

    // one cache per process, shared by every request
    let cache = Arc::new(GenerationCache::new(args.cache_ttl, args.cache_max_items));
    let generator = CachedGenerator::new(Arc::new(gemini), cache, args.model.clone());
    let cache_enabled = generator.cache().is_enabled();

    let state = Arc::new(AppState {
        generator: Arc::new(generator),
        upload_folder: args.upload_folder.clone(),
    });

    let router = app(state, args.max_content_length);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = args.port, "Gateway running");
    info!(model = %args.model, base_url = %args.gemini_base_url, "Forwarding to Gemini");
    if cache_enabled {
        info!(ttl_secs = args.cache_ttl, max_items = args.cache_max_items, "Generation cache enabled");
    } else {
        info!("Generation cache disabled");
    }
    info!(folder = %args.upload_folder.display(), max_bytes = args.max_content_length, "Accepting uploads");

    axum::serve(listener, router).await?;
    Ok(())
}
