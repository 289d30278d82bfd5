use std::path::PathBuf;
use std::sync::Arc;
use crate::generator::TextGenerator;

// app's shared state
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>, // cache-fronted Gemini client
    pub upload_folder: PathBuf,
}
