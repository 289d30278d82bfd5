use std::path::Path;
use crate::error::ExtractError;

pub const ALLOWED_EXTENSIONS: [&str; 2] = ["pdf", "txt"];

// Lowercased extension without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_allowed(filename: &str) -> bool {
    extension_of(Path::new(filename)).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Extract plain text from a `.txt` or `.pdf` file.
///
/// Text files are read as UTF-8 with invalid sequences dropped. PDF pages are
/// joined with a newline; pages without text are skipped.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    if path.as_os_str().is_empty() {
        return Err(ExtractError::InvalidPath);
    }
    if !path.is_file() {
        return Err(ExtractError::NotFound(path.to_path_buf()));
    }

    match extension_of(path).as_deref() {
        Some("txt") => extract_txt(path),
        Some("pdf") => extract_pdf(path),
        other => Err(ExtractError::UnsupportedExtension(
            other.map(|e| format!(".{e}")).unwrap_or_default(),
        )),
    }
}

fn extract_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).replace(char::REPLACEMENT_CHARACTER, ""))
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let text: Vec<&str> = pages
        .iter()
        .map(|p| p.trim_end_matches('\n'))
        .filter(|p| !p.trim().is_empty())
        .collect();
    Ok(text.join("\n"))
}
