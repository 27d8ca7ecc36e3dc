//! Text embedding providers.
//!
//! [`EmbeddingProvider`] maps text to fixed-dimension vectors. Providers are
//! deterministic for a fixed loaded model and have no side effects, so a
//! single instance can be shared across threads.
//!
//! Empty-input policy: every provider rejects empty or whitespace-only text
//! with [`RetrievalError::Encoding`]; no provider invents a vector for it.

/// Deterministic feature-hashing embedder with no model files.
pub mod hashing;

#[cfg(feature = "fastembed")]
/// Local ONNX sentence embeddings via fastembed.
pub mod fastembed;

pub use hashing::HashingEmbedder;

#[cfg(feature = "fastembed")]
pub use self::fastembed::FastEmbedProvider;

use crate::error::{Result, RetrievalError};

/// Maps text to fixed-dimension embedding vectors.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the loaded model.
    fn model_name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Encodes a batch of texts, one vector per input in input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Encodes a single text.
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        self.encode_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| RetrievalError::encoding("provider returned no vector"))
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn model_name(&self) -> &str {
        (**self).model_name()
    }
    fn dimension(&self) -> usize {
        (**self).dimension()
    }
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).encode_batch(texts)
    }
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        (**self).encode(text)
    }
}

/// Applies the shared empty-input policy to a batch.
pub(crate) fn reject_blank(texts: &[String]) -> Result<()> {
    if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
        return Err(RetrievalError::encoding(format!(
            "input {i} is empty; blank text has no embedding"
        )));
    }
    Ok(())
}

/// Checks that a provider returned one vector of the right size per input.
pub(crate) fn check_output(
    vectors: &[Vec<f32>],
    expected_count: usize,
    dimension: usize,
) -> Result<()> {
    if vectors.len() != expected_count {
        return Err(RetrievalError::encoding(format!(
            "provider returned {} vectors for {expected_count} inputs",
            vectors.len()
        )));
    }
    if let Some(v) = vectors.iter().find(|v| v.len() != dimension) {
        return Err(RetrievalError::encoding(format!(
            "provider returned a {}-dimensional vector, expected {dimension}",
            v.len()
        )));
    }
    Ok(())
}
