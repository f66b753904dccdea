use thiserror::Error;

/// Errors that can occur while talking to the vector index
///
/// A missing collection, a missing named vector, or a zero-result search
/// are *not* errors; they surface as empty result sets. These variants
/// cover genuine transport or input failures only.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    /// The embedding provider failed to produce a query vector
    #[error("Embedding provider error: {0}")]
    Embedding(String),

    /// The backing store rejected or failed a search
    #[error("Vector backend error: {0}")]
    Backend(String),

    /// Malformed search input (empty vector name, zero limit, ...)
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, VectorIndexError>;
