//! Error taxonomy for the retrieval engine.
//!
//! Every fallible operation returns [`RetrievalError`]. None of these
//! conditions is fatal to the host process; the caller picks the retry,
//! degrade, or abort policy.

use thiserror::Error;

/// Errors produced by the embedding, indexing, storage, and persistence layers.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Malformed caller input: length mismatch, `top_k == 0`, empty text,
    /// wrong vector dimension, or an input limit exceeded.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Persisted artifacts exist but cannot be read back.
    #[error("failed to load persisted store: {0}")]
    Load(String),

    /// The embedding provider could not encode the input.
    #[error("embedding failed: {0}")]
    Encoding(String),

    /// Out-of-range access into the document store. Unreachable from valid
    /// external calls; seeing it means the index/store alignment broke.
    #[error("position {position} out of range for store of {len} passages")]
    Index { position: usize, len: usize },

    /// Filesystem failure while writing artifacts.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RetrievalError>;

impl RetrievalError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message() {
        let err = RetrievalError::Index {
            position: 7,
            len: 3,
        };
        assert_eq!(
            err.to_string(),
            "position 7 out of range for store of 3 passages"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err: RetrievalError = io.into();
        assert!(matches!(err, RetrievalError::Io(_)));
    }
}
