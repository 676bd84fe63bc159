//! Domain-level contract violations

/// Raised by entity constructors and mutators before any row is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse failed: {0}")]
    ParseFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),
}
