use serde::{Deserialize, Serialize};

// Gateway API request/response formats

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct GenerateResponse {
    pub output: String,
}

// Body shared by /summarize and /flashcards
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct TextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct FlashcardsResponse {
    pub cards: Vec<Flashcard>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UploadedFile {
    pub original_name: String,
    pub stored_name: String,
    pub relative_path: String,
    pub mime_type: Option<String>,
    pub size_bytes: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct UploadResponse {
    pub message: String,
    pub file: UploadedFile,
    pub extracted_text_chars: usize,
    pub extracted_text_preview: String,
}

// Gemini generateContent request format
#[derive(Serialize, Debug)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Serialize, Debug)]
pub struct GeminiContent {
    pub role: String,
    pub parts: Vec<GeminiTextPart>,
}

#[derive(Serialize, Debug)]
pub struct GeminiTextPart {
    pub text: String,
}

// Gemini generateContent response format (only the fields we read)
#[derive(Deserialize, Debug, Default)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiCandidate {
    pub content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiCandidateContent {
    #[serde(default)]
    pub parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiResponsePart {
    pub text: Option<String>,
    // set on reasoning steps of thinking models
    #[serde(default)]
    pub thought: bool,
}
