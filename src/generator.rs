use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::cache::{CacheKey, GenerationCache};
use crate::error::GenerationError;
use crate::metrics::{CACHE_HITS, CACHE_MISSES, UPSTREAM_ERRORS};
use crate::models::{GeminiContent, GeminiRequest, GeminiResponse, GeminiTextPart};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash";

/// Something that turns a prompt into generated text.
///
/// `model` of `None` means "use the implementation's default model".
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, GenerationError>;
}

// Client for the Gemini generateContent endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    default_model: String,
}

impl GeminiClient {
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: &str,
        default_model: &str,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: default_model.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    // Accepts both "gemini-2.0-flash" and "models/gemini-2.0-flash"
    fn api_url(&self, model: &str) -> String {
        let name = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.base_url, name)
    }

    fn request_body(prompt: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiTextPart {
                    text: prompt.to_string(),
                }],
            }],
        }
    }

    /// Joins the text parts of the first candidate.
    ///
    /// Parts flagged as thoughts are skipped unless nothing else is present.
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let parts = &response.candidates.first()?.content.as_ref()?.parts;

        let answer: Vec<&str> = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        if !answer.is_empty() {
            return Some(answer.concat());
        }

        let thoughts: Vec<&str> = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!thoughts.is_empty()).then(|| thoughts.concat())
    }

    // Pull `error.message` out of a Gemini error body, else use the raw body
    fn error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
            .unwrap_or_else(|| body.to_string())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::NotConfigured(
                "GEMINI_API_KEY is not set. Export it in your environment before calling Gemini".to_string(),
            )
        })?;
        let model = model.unwrap_or(&self.default_model);

        debug!(model, "Calling Gemini generateContent");

        let res = self
            .client
            .post(self.api_url(model))
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(prompt))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message: Self::error_message(&body),
            });
        }

        let body = res
            .json::<GeminiResponse>()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        match Self::extract_text(&body) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyResponse),
        }
    }
}

/// Puts a [`GenerationCache`] in front of another generator.
///
/// Lookups use the resolved model name, so a request without a model and one
/// naming the default model share entries. Failures and empty outputs are
/// returned to the caller and never stored.
pub struct CachedGenerator {
    inner: Arc<dyn TextGenerator>,
    cache: Arc<GenerationCache>,
    default_model: String,
}

impl CachedGenerator {
    pub fn new(
        inner: Arc<dyn TextGenerator>,
        cache: Arc<GenerationCache>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            cache,
            default_model: default_model.into(),
        }
    }

    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }
}

#[async_trait]
impl TextGenerator for CachedGenerator {
    async fn generate(&self, prompt: &str, model: Option<&str>) -> Result<String, GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        let model = model
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.default_model);

        // check cache first
        if let Some(hit) = self.cache.get(model, prompt) {
            CACHE_HITS.inc();
            debug!(model, key = %CacheKey::new(model, prompt).short_hex(), "Cache HIT");
            return Ok(hit);
        }
        CACHE_MISSES.inc();

        let text = match self.inner.generate(prompt, Some(model)).await {
            Ok(text) => text,
            Err(e) => {
                UPSTREAM_ERRORS.inc();
                warn!(model, error = %e, "Generation failed");
                return Err(e);
            }
        };
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        self.cache.put(model, prompt, text.clone());
        Ok(text)
    }
}
