//! Sentence embeddings from a local ONNX model via `fastembed`.
//!
//! The model is downloaded on first use into the fastembed cache and then
//! runs fully offline. Inference takes an exclusive lock on the session, so
//! concurrent callers are serialised per provider instance.

use crate::config::EMBED_BATCH_SIZE;
use crate::embedding::{check_output, reject_blank, EmbeddingProvider};
use crate::error::{Result, RetrievalError};
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;

/// Resolves a model identifier to a fastembed model and its output dimension.
fn resolve_model(model_id: &str) -> Result<(EmbeddingModel, usize)> {
    let normalized = model_id.trim().to_ascii_lowercase();
    let resolved = match normalized.as_str() {
        "sentence-transformers/all-minilm-l6-v2" | "all-minilm-l6-v2" => {
            (EmbeddingModel::AllMiniLML6V2, 384)
        }
        "baai/bge-small-en-v1.5" | "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
        "baai/bge-base-en-v1.5" | "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
        "sentence-transformers/paraphrase-multilingual-minilm-l12-v2" => {
            (EmbeddingModel::ParaphraseMLMiniLML12V2, 384)
        }
        _ => {
            return Err(RetrievalError::encoding(format!(
                "unsupported embedding model '{model_id}'"
            )))
        }
    };
    Ok(resolved)
}

/// Local sentence-embedding model.
pub struct FastEmbedProvider {
    model_name: String,
    dimension: usize,
    model: Mutex<TextEmbedding>,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

impl FastEmbedProvider {
    /// Loads the model named by `model_id` (e.g. `sentence-transformers/all-MiniLM-L6-v2`).
    pub fn try_new(model_id: &str) -> Result<Self> {
        Self::load(model_id, None)
    }

    /// Loads the model, caching weights under `cache_dir`.
    pub fn with_cache_dir(model_id: &str, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::load(model_id, Some(cache_dir.into()))
    }

    fn load(model_id: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let (model, dimension) = resolve_model(model_id)?;
        tracing::info!("Loading embedding model '{}'", model_id);

        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }
        let session = TextEmbedding::try_new(options).map_err(|e| {
            RetrievalError::encoding(format!("failed to load model '{model_id}': {e}"))
        })?;

        Ok(Self {
            model_name: model_id.to_string(),
            dimension,
            model: Mutex::new(session),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        reject_blank(texts)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let model = self.model.lock();
        let vectors = model
            .embed(texts.to_vec(), Some(EMBED_BATCH_SIZE))
            .map_err(|e| RetrievalError::encoding(e.to_string()))?;
        check_output(&vectors, texts.len(), self.dimension)?;
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_models() {
        let (_, dim) = resolve_model("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(dim, 384);
        let (_, dim) = resolve_model("BAAI/bge-base-en-v1.5").unwrap();
        assert_eq!(dim, 768);
    }

    #[test]
    fn test_resolve_unknown_model() {
        assert!(matches!(
            resolve_model("made-up/model"),
            Err(RetrievalError::Encoding(_))
        ));
    }
}
