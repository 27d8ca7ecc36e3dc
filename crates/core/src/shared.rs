//! Thread-safe handle to one retrieval service.
//!
//! Enforces the single-writer rule for hosts that dispatch concurrent
//! requests: `add_knowledge` and loads hold the write lock, so no reader ever
//! sees the index and store at different lengths; searches, stats, and saves
//! share the read lock. Cloning produces another handle to the same service.

use crate::config::EngineConfig;
use crate::document::Metadata;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::{FlatIndex, VectorIndex};
use crate::service::{RetrievalService, SearchHit, Stats};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Shared, lock-guarded [`RetrievalService`].
pub struct SharedRetrieval<E: EmbeddingProvider, I: VectorIndex = FlatIndex> {
    inner: Arc<RwLock<RetrievalService<E, I>>>,
}

impl<E: EmbeddingProvider, I: VectorIndex> Clone for SharedRetrieval<E, I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: EmbeddingProvider, I: VectorIndex> SharedRetrieval<E, I> {
    /// Wraps an existing service.
    pub fn new(service: RetrievalService<E, I>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(service)),
        }
    }

    /// Opens a service (see [`RetrievalService::open`]) and wraps it.
    pub fn open(provider: E, config: EngineConfig) -> Result<Self> {
        RetrievalService::open(provider, config).map(Self::new)
    }

    pub fn add_knowledge(
        &self,
        texts: Vec<String>,
        metadata: Option<Vec<Metadata>>,
    ) -> Result<usize> {
        self.inner.write().add_knowledge(texts, metadata)
    }

    pub fn search(
        &self,
        query: &str,
        top_k: usize,
        filter_topic: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        self.inner.read().search(query, top_k, filter_topic)
    }

    pub fn get_stats(&self) -> Stats {
        self.inner.read().get_stats()
    }

    pub fn save(&self) -> Result<()> {
        self.inner.read().save()
    }

    pub fn load_from(&self, base: &Path) -> Result<bool> {
        self.inner.write().load_from(base)
    }

    /// Runs `f` with shared access to the service.
    pub fn with_read<R>(&self, f: impl FnOnce(&RetrievalService<E, I>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` with exclusive access to the service.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut RetrievalService<E, I>) -> R) -> R {
        f(&mut self.inner.write())
    }
}
