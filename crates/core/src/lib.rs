//! # passagedb-core
//!
//! Local semantic passage retrieval for grounding generated answers: embed
//! text, store it in an exact squared-L2 vector index aligned with a passage
//! store, and return the top-k nearest passages for a query.
//!
//! ```text
//! RetrievalService ─┬─ EmbeddingProvider   text → Vec<f32>
//!                   ├─ VectorIndex         row i ↔ embedding of passage i
//!                   └─ DocumentStore       row i ↔ (text, metadata) of passage i
//! persistence: <base>.index (vector blob) + <base>.docs (documents, metadata)
//! ```
//!
//! Synchronous and single-process. Wrap a service in [`SharedRetrieval`] to
//! share it across request handlers.

/// Boundary request/response models and handlers for an HTTP layer.
pub mod api;
/// Configuration constants and runtime [`EngineConfig`](config::EngineConfig).
pub mod config;
/// Passage and metadata types.
pub mod document;
/// Embedding providers: trait, feature-hashing embedder, fastembed backend.
pub mod embedding;
/// Error taxonomy.
pub mod error;
/// Exact vector index: trait, flat backend, distance.
pub mod index;
/// Typed knowledge records and the seed corpus.
pub mod knowledge;
/// Paired-artifact save/load.
pub mod persistence;
/// Retrieval orchestration.
pub mod service;
/// Lock-guarded shared service handle.
pub mod shared;
/// Position-aligned passage store.
pub mod store;

pub use config::EngineConfig;
pub use document::{Metadata, MetadataValue, Passage};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{Result, RetrievalError};
pub use index::{FlatIndex, Neighbor, VectorIndex};
pub use service::{LoadStatus, RetrievalService, SearchHit, Stats};
pub use shared::SharedRetrieval;
pub use store::DocumentStore;

#[cfg(feature = "fastembed")]
pub use embedding::FastEmbedProvider;
