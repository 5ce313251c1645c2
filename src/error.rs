//! Error types for query evaluation

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Full-text weight out of range (|w| <= 1000): {0}")]
    FtWeight(f64),

    #[error("{expected} expected, {found} found")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Variable ${0} is not bound")]
    UnboundVariable(String),

    #[error("No focus text for full-text evaluation")]
    NoFocus,

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueryError {
    pub fn type_error(expected: &'static str, found: &'static str) -> Self {
        Self::Type { expected, found }
    }
}
