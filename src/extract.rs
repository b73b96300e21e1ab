//! PDF text extraction.
//!
//! Uploads are opaque bytes; this module turns them into the plain UTF-8
//! text the summarizer works on. Parsing is delegated entirely to
//! `pdf-extract`; a failure here means the upload was not a readable PDF.

/// Extraction error. The pipeline reports it as a validation failure
/// since it is caused by the uploaded bytes, not by any store.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Empty,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Empty => write!(f, "document contains no extractable text"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from PDF bytes.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_returns_error() {
        let err = extract_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn empty_input_returns_error() {
        let err = extract_text(b"").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
