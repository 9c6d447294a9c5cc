//! Plain-text extraction from uploaded documents

mod docx;
mod pdf;

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Document formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Pick the format from a file name's extension, ignoring case
    pub fn from_filename(filename: &str) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            "" => Err(Error::UnsupportedFileType(
                "file has no extension; only .pdf and .docx are allowed".to_string(),
            )),
            other => Err(Error::UnsupportedFileType(format!(
                ".{}; only .pdf and .docx are allowed",
                other
            ))),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Docx => write!(f, "docx"),
        }
    }
}

/// Extract the text of a document, trimmed
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String> {
    let text = match kind {
        DocumentKind::Pdf => pdf::extract_text(bytes)?,
        DocumentKind::Docx => docx::extract_text(bytes)?,
    };
    Ok(text.trim().to_string())
}

/// Run [`extract_text`] on the blocking pool
pub async fn extract_text_blocking(bytes: Vec<u8>, kind: DocumentKind) -> Result<String> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, kind))
        .await
        .map_err(|e| Error::Extraction(format!("{} parser crashed: {}", kind, e)))?
}
