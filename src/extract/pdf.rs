//! PDF text via `pdf-extract`

use crate::error::{Error, Result};

pub fn extract_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extraction(format!("could not read PDF: {}", e)))
}
