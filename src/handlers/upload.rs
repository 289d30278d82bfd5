use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use crate::error::ApiError;
use crate::extract::{extension_of, extract_text, is_allowed};
use crate::models::{UploadResponse, UploadedFile};
use crate::state::AppState;

const PREVIEW_CHARS: usize = 200;

// Accepts a multipart form with a `file` field (.pdf or .txt)
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("invalid multipart body").with_details(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request("failed to read uploaded file").with_details(e.to_string()))?;

        let response = store_upload(&state.upload_folder, &filename, &data).await?;
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(ApiError::bad_request("no file part in the request"))
}

/// Saves the upload under a random name and extracts its text.
///
/// The stored file is removed again if extraction fails.
pub async fn store_upload(
    upload_folder: &Path,
    filename: &str,
    data: &[u8],
) -> Result<UploadResponse, ApiError> {
    if filename.is_empty() {
        return Err(ApiError::bad_request("no selected file"));
    }
    if !is_allowed(filename) {
        return Err(ApiError::bad_request("only PDF and TXT files are allowed"));
    }
    let ext = extension_of(Path::new(filename)).unwrap_or_default();
    let original_name = sanitize_filename(filename);
    let stored_name = format!("{}.{}", Uuid::new_v4().simple(), ext);

    tokio::fs::create_dir_all(upload_folder)
        .await
        .map_err(|e| ApiError::internal("failed to create upload folder").with_details(e.to_string()))?;
    let save_path = upload_folder.join(&stored_name);
    tokio::fs::write(&save_path, data)
        .await
        .map_err(|e| ApiError::internal("failed to save file").with_details(e.to_string()))?;

    // pdf parsing is CPU bound
    let path = save_path.clone();
    let extracted = tokio::task::spawn_blocking(move || extract_text(&path))
        .await
        .map_err(|e| ApiError::internal("text extraction task failed").with_details(e.to_string()))?;

    let text = match extracted {
        Ok(text) => text,
        Err(e) => {
            warn!(file = %stored_name, error = %e, "Text extraction failed, removing upload");
            if let Err(rm) = tokio::fs::remove_file(&save_path).await {
                warn!(file = %stored_name, error = %rm, "Failed to remove upload");
            }
            return Err(ApiError::bad_request("failed to extract text from file").with_details(e.to_string()));
        }
    };

    info!(file = %stored_name, bytes = data.len(), chars = text.chars().count(), "Stored upload");

    Ok(UploadResponse {
        message: "file uploaded and text extracted successfully".to_string(),
        file: UploadedFile {
            original_name,
            relative_path: format!("{}/{}", upload_folder.display(), stored_name),
            stored_name,
            mime_type: mime_type(&ext).map(str::to_string),
            size_bytes: data.len() as u64,
        },
        extracted_text_chars: text.chars().count(),
        extracted_text_preview: text.chars().take(PREVIEW_CHARS).collect(),
    })
}

fn mime_type(ext: &str) -> Option<&'static str> {
    match ext {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

// Last path component, whitespace to '_', anything outside [A-Za-z0-9._-] dropped
fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}
