//! Configuration for passagedb.
//!
//! Tuning parameters and input validation limits are compile-time constants.
//! Deployment-specific settings (artifact location, model identifier,
//! overfetch factor) live in [`EngineConfig`], which can be deserialized from
//! a config file or read from environment variables.

use crate::error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default sentence-embedding model identifier.
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of [`DEFAULT_MODEL`].
pub const DEFAULT_DIMENSION: usize = 384;

/// Candidate multiplier applied to `top_k` before topic filtering.
///
/// `search` pulls `top_k * OVERFETCH` nearest rows and filters those, so a
/// sparse topic among near neighbours can yield fewer than `top_k` hits.
pub const DEFAULT_OVERFETCH: usize = 2;

/// Default number of results when a request does not specify one.
pub const DEFAULT_TOP_K: usize = 3;

/// Default base path for the persisted artifact pair.
pub const DEFAULT_INDEX_PATH: &str = "./data/embeddings/knowledge";

/// Metadata key used for topic filtering and stats.
pub const TOPIC_KEY: &str = "topic";

/// Topic reported in stats for passages without a string topic.
pub const UNKNOWN_TOPIC: &str = "unknown";

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Maximum number of results (`top_k`) per search request.
pub const MAX_TOP_K: usize = 1_000;

/// Maximum length of passage or query text in bytes.
pub const MAX_TEXT_LEN: usize = 100_000;

/// Maximum number of passages per `add_knowledge` call.
pub const MAX_BATCH_SIZE: usize = 1_000;

/// Number of texts handed to the embedding model per inference batch.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Environment variable overriding [`EngineConfig::index_path`].
pub const ENV_INDEX_PATH: &str = "KNOWLEDGE_INDEX_PATH";
/// Environment variable overriding [`EngineConfig::model`].
pub const ENV_MODEL: &str = "EMBEDDING_MODEL";
/// Environment variable overriding [`EngineConfig::overfetch`].
pub const ENV_OVERFETCH: &str = "KNOWLEDGE_OVERFETCH";

/// Runtime settings for a retrieval engine instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Base path of the artifact pair (`<base>.index` / `<base>.docs`).
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    /// Embedding model identifier handed to the provider at load time.
    #[serde(default = "default_model")]
    pub model: String,
    /// Candidate multiplier for filtered search. Must be at least 1.
    #[serde(default = "default_overfetch")]
    pub overfetch: usize,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_PATH)
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_overfetch() -> usize {
    DEFAULT_OVERFETCH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            model: default_model(),
            overfetch: default_overfetch(),
        }
    }
}

impl EngineConfig {
    /// Builds a config from defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_INDEX_PATH).filter(|s| !s.trim().is_empty()) {
            config.index_path = PathBuf::from(path);
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|s| !s.trim().is_empty()) {
            config.model = model;
        }
        if let Some(raw) = lookup(ENV_OVERFETCH) {
            config.overfetch = raw.trim().parse().map_err(|_| {
                RetrievalError::validation(format!("{ENV_OVERFETCH} must be an integer, got '{raw}'"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings that cannot be expressed in the type.
    pub fn validate(&self) -> Result<()> {
        if self.overfetch == 0 {
            return Err(RetrievalError::validation("overfetch must be >= 1"));
        }
        if self.model.trim().is_empty() {
            return Err(RetrievalError::validation("model identifier must not be empty"));
        }
        Ok(())
    }

    /// Returns a copy with a different artifact base path.
    pub fn with_index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_path = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.overfetch, 2);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            (ENV_INDEX_PATH, "/tmp/kb/store"),
            (ENV_MODEL, "BAAI/bge-small-en-v1.5"),
            (ENV_OVERFETCH, "4"),
        ]))
        .unwrap();
        assert_eq!(config.index_path, PathBuf::from("/tmp/kb/store"));
        assert_eq!(config.model, "BAAI/bge-small-en-v1.5");
        assert_eq!(config.overfetch, 4);
    }

    #[test]
    fn test_bad_overfetch_rejected() {
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_OVERFETCH, "lots")])).unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));
        let err = EngineConfig::from_lookup(lookup_from(&[(ENV_OVERFETCH, "0")])).unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"overfetch": 3}"#).unwrap();
        assert_eq!(config.overfetch, 3);
        assert_eq!(config.index_path, PathBuf::from(DEFAULT_INDEX_PATH));
    }
}
