//! Retrieval service: the single context object owning the embedding
//! provider, the vector index, and the document store.
//!
//! ```text
//! add_knowledge: texts → provider.encode_batch → index.add + store.append
//! search:        query → provider.encode → index.search(top_k * overfetch)
//!                      → store lookup → topic filter → first top_k hits
//! ```
//!
//! Mutating methods take `&mut self` and reads take `&self`, so a single
//! owner cannot interleave an append with a search. Hosts that share one
//! instance across threads wrap it in [`SharedRetrieval`](crate::shared::SharedRetrieval).

use crate::config::{self, EngineConfig};
use crate::document::Metadata;
use crate::embedding::{check_output, EmbeddingProvider};
use crate::error::{Result, RetrievalError};
use crate::index::{FlatIndex, VectorIndex};
use crate::knowledge::{Experiment, QaPair};
use crate::persistence;
use crate::store::DocumentStore;
use serde::Serialize;
use std::path::Path;

/// Outcome of the startup load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No load was attempted, or no artifacts existed: started empty.
    Fresh,
    /// Artifacts were loaded.
    Loaded { passages: usize },
    /// Artifacts existed but were unreadable; started empty instead.
    Recovered { reason: String },
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Insertion position of the passage.
    pub position: usize,
    pub text: String,
    /// Squared L2 distance to the query; lower is more relevant.
    pub score: f32,
    pub metadata: Metadata,
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_passages: usize,
    /// Sorted distinct `topic` metadata values; untagged passages report
    /// as `"unknown"`.
    pub topics: Vec<String>,
    pub embedding_dimension: usize,
    pub model: String,
}

/// Semantic passage retrieval over an exact vector index.
pub struct RetrievalService<E: EmbeddingProvider, I: VectorIndex = FlatIndex> {
    provider: E,
    index: I,
    store: DocumentStore,
    config: EngineConfig,
    status: LoadStatus,
}

impl<E: EmbeddingProvider, I: VectorIndex> std::fmt::Debug for RetrievalService<E, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("model", &self.provider.model_name())
            .field("dimension", &self.index.dimension())
            .field("passages", &self.store.len())
            .field("status", &self.status)
            .finish()
    }
}

impl<E: EmbeddingProvider, I: VectorIndex> RetrievalService<E, I> {
    /// Creates an empty service without touching disk.
    pub fn new(provider: E, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let dimension = provider.dimension();
        if dimension == 0 || dimension > config::MAX_DIMENSION {
            return Err(RetrievalError::validation(format!(
                "provider dimension {dimension} must be in 1..={}",
                config::MAX_DIMENSION
            )));
        }
        Ok(Self {
            index: I::with_dimension(dimension),
            store: DocumentStore::new(),
            provider,
            config,
            status: LoadStatus::Fresh,
        })
    }

    /// Creates the service and attempts to load `config.index_path`.
    ///
    /// Missing artifacts give an empty store. Unreadable artifacts are logged
    /// and recorded in [`load_status`](Self::load_status); the service still
    /// starts, empty and searchable. Only an invalid config or provider fails.
    pub fn open(provider: E, config: EngineConfig) -> Result<Self> {
        let mut service = Self::new(provider, config)?;
        let base = service.config.index_path.clone();
        if let Err(e) = service.load_from(&base) {
            tracing::warn!(
                "Could not load knowledge base from {:?}: {}; starting with an empty store",
                base,
                e
            );
            service.status = LoadStatus::Recovered {
                reason: e.to_string(),
            };
        }
        Ok(service)
    }

    /// Replaces the contents with the artifacts under `base`.
    ///
    /// Returns `Ok(false)` and leaves the service unchanged if no artifacts
    /// exist. On error the service is also unchanged.
    pub fn load_from(&mut self, base: &Path) -> Result<bool> {
        let Some((index, store)) = persistence::load::<I>(base)? else {
            return Ok(false);
        };
        if index.dimension() != self.provider.dimension() {
            return Err(RetrievalError::load(format!(
                "persisted index dimension {} does not match provider '{}' dimension {}",
                index.dimension(),
                self.provider.model_name(),
                self.provider.dimension()
            )));
        }
        self.status = LoadStatus::Loaded {
            passages: store.len(),
        };
        self.index = index;
        self.store = store;
        Ok(true)
    }

    /// Saves to the configured `index_path`.
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.config.index_path)
    }

    /// Saves the artifact pair under `base`.
    pub fn save_to(&self, base: &Path) -> Result<()> {
        persistence::save(base, &self.index, &self.store)
    }

    /// Embeds and appends passages. Returns how many were added.
    ///
    /// `metadata`, when given, must match `texts` in length. All embeddings
    /// are computed and checked before anything is appended, so a failure
    /// leaves the store unchanged.
    pub fn add_knowledge(
        &mut self,
        texts: Vec<String>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize> {
        if let Some(ref m) = metadata {
            if m.len() != texts.len() {
                return Err(RetrievalError::validation(format!(
                    "got {} texts but {} metadata entries",
                    texts.len(),
                    m.len()
                )));
            }
        }
        if texts.is_empty() {
            return Ok(0);
        }
        if texts.len() > config::MAX_BATCH_SIZE {
            return Err(RetrievalError::validation(format!(
                "batch of {} passages exceeds limit of {}",
                texts.len(),
                config::MAX_BATCH_SIZE
            )));
        }
        for (i, text) in texts.iter().enumerate() {
            validate_text(text).map_err(|msg| RetrievalError::validation(format!("text {i}: {msg}")))?;
        }

        tracing::debug!("Embedding {} passages", texts.len());
        let vectors = self.provider.encode_batch(&texts)?;
        check_output(&vectors, texts.len(), self.index.dimension())?;
        self.index.add(&vectors)?;

        let count = texts.len();
        let metadata = metadata.unwrap_or_else(|| vec![Metadata::new(); count]);
        for (text, meta) in texts.into_iter().zip(metadata) {
            self.store.append(text, meta);
        }
        debug_assert_eq!(self.index.len(), self.store.len());

        tracing::info!(
            "Added {} passages; knowledge base now contains {}",
            count,
            self.store.len()
        );
        Ok(count)
    }

    /// Adds experiment records as `"name: description"` passages.
    pub fn add_experiments(&mut self, experiments: &[Experiment]) -> Result<usize> {
        let (texts, metadata): (Vec<String>, Vec<Metadata>) = experiments
            .iter()
            .map(Experiment::to_passage)
            .unzip();
        self.add_knowledge(texts, Some(metadata))
    }

    /// Adds question/answer pairs as `"Q: ...\nA: ..."` passages.
    pub fn add_qa_pairs(&mut self, pairs: &[QaPair]) -> Result<usize> {
        let (texts, metadata): (Vec<String>, Vec<Metadata>) =
            pairs.iter().map(QaPair::to_passage).unzip();
        self.add_knowledge(texts, Some(metadata))
    }

    /// Returns up to `top_k` passages nearest to `query`, closest first.
    ///
    /// With `filter_topic`, only passages whose `topic` equals it are kept,
    /// chosen from the `top_k * overfetch` nearest candidates; fewer than
    /// `top_k` hits may come back. Never pads, never errors on a short result.
    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        filter_topic: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(RetrievalError::validation("top_k must be >= 1"));
        }
        if top_k > config::MAX_TOP_K {
            return Err(RetrievalError::validation(format!(
                "top_k {top_k} exceeds limit of {}",
                config::MAX_TOP_K
            )));
        }
        validate_text(query).map_err(|msg| RetrievalError::validation(format!("query: {msg}")))?;
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.provider.encode(query)?;
        let fetch = top_k
            .saturating_mul(self.config.overfetch)
            .min(self.index.len());
        let candidates = self.index.search(&query_vector, fetch)?;

        let mut hits = Vec::with_capacity(top_k.min(candidates.len()));
        for candidate in &candidates {
            let passage = self.store.get(candidate.id)?;
            if let Some(topic) = filter_topic {
                if passage.topic() != Some(topic) {
                    continue;
                }
            }
            hits.push(SearchHit {
                position: passage.position,
                text: passage.text.to_string(),
                score: candidate.distance,
                metadata: passage.metadata.clone(),
            });
            if hits.len() >= top_k {
                break;
            }
        }

        tracing::debug!(
            "Search top_k={} filter={:?}: {} candidates, {} hits",
            top_k,
            filter_topic,
            candidates.len(),
            hits.len()
        );
        Ok(hits)
    }

    /// Ordered passage texts for prompt assembly.
    pub fn context_passages(
        &self,
        query: &str,
        top_k: usize,
        filter_topic: Option<&str>,
    ) -> Result<Vec<String>> {
        Ok(self
            .search(query, top_k, filter_topic)?
            .into_iter()
            .map(|hit| hit.text)
            .collect())
    }

    pub fn get_stats(&self) -> Stats {
        Stats {
            total_passages: self.store.len(),
            topics: self.store.topics(),
            embedding_dimension: self.index.dimension(),
            model: self.provider.model_name().to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &E {
        &self.provider
    }

    /// Read access to the passage store.
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }
}

fn validate_text(text: &str) -> std::result::Result<(), String> {
    if text.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    if text.len() > config::MAX_TEXT_LEN {
        return Err(format!(
            "{} bytes exceeds limit of {}",
            text.len(),
            config::MAX_TEXT_LEN
        ));
    }
    Ok(())
}
