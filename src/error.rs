//! Error taxonomy shared by the ingestion, listing, and retrieval paths.
//!
//! Every failure surfaced to a caller is one of four kinds: bad input
//! (`Validation`), a failed or unparseable model call (`Summarization`),
//! a blob or metadata store failure (`Storage`), or a lookup miss
//! (`NotFound`). Nothing is retried at this layer.

/// A failure in one of the library services.
#[derive(Debug)]
pub enum LibraryError {
    /// A required input is missing or malformed. Raised before any store
    /// is contacted.
    Validation(String),
    /// The summarization call failed or returned output that could not be
    /// parsed into the three expected fields.
    Summarization(String),
    /// A blob or metadata store operation failed.
    Storage(String),
    /// No document matches the requested `(folder, filename)`.
    NotFound(String),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Validation(msg) => write!(f, "validation failed: {}", msg),
            LibraryError::Summarization(msg) => write!(f, "summarization failed: {}", msg),
            LibraryError::Storage(msg) => write!(f, "storage error: {}", msg),
            LibraryError::NotFound(msg) => write!(f, "not found: {}", msg),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<sqlx::Error> for LibraryError {
    fn from(err: sqlx::Error) -> Self {
        LibraryError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = LibraryError::Validation("missing required field(s): folder".to_string());
        assert_eq!(
            err.to_string(),
            "validation failed: missing required field(s): folder"
        );
    }

    #[test]
    fn sqlx_errors_map_to_storage() {
        let err: LibraryError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, LibraryError::Storage(_)));
    }
}
