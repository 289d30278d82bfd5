use clap::Parser;
use std::path::PathBuf;
use crate::generator::{DEFAULT_GEMINI_BASE_URL, DEFAULT_MODEL};

// CLI argument structure, every flag also readable from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "gemini-gateway")]
#[command(about = "Study-material backend with a caching proxy for Gemini")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    // Gemini API key; generation calls fail until it is set
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    // Model used when a request does not name one
    #[arg(short, long, env = "GEMINI_MODEL_NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    // Upstream request timeout in seconds
    #[arg(long, env = "GEMINI_TIMEOUT_SECONDS", default_value_t = 60)]
    pub request_timeout: u64,

    // Cache TTL in seconds, 0 or negative disables the cache
    #[arg(short, long, env = "GEMINI_CACHE_TTL_SECONDS", default_value_t = 300, allow_negative_numbers = true)]
    pub cache_ttl: i64,

    // Max cached generations
    #[arg(long, env = "GEMINI_CACHE_MAX_ITEMS", default_value_t = 256)]
    pub cache_max_items: usize,

    // Uploads land in <upload_folder>/<uuid>.<ext>
    #[arg(long, env = "UPLOAD_FOLDER", default_value = "uploads")]
    pub upload_folder: PathBuf,

    // Max request body size in bytes
    #[arg(long, env = "MAX_CONTENT_LENGTH", default_value_t = 16 * 1024 * 1024)]
    pub max_content_length: usize,
}
