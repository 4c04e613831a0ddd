use std::fmt;
use thiserror::Error;

/// Failures that stop a retrieval call. "No good match" is not one of them:
/// that is an empty `Retrieval`.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Embedding failed: {0:#}")]
    Embedding(anyhow::Error),

    #[error("Index search failed: {0:#}")]
    Index(anyhow::Error),
}

/// An index id with no catalog row behind it. Reported, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityFault {
    pub id: i64,
    pub catalog_len: usize,
}

impl fmt::Display for IntegrityFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index id {} has no catalog entry (catalog holds {})", self.id, self.catalog_len)
    }
}
