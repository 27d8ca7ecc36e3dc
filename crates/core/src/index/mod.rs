//! Exact nearest-neighbour vector index.
//!
//! [`VectorIndex`] is the backend seam used by the retrieval service: an
//! append-only collection of fixed-dimension vectors answering exhaustive
//! k-nearest-neighbour queries by squared Euclidean distance. [`FlatIndex`]
//! is the dense contiguous implementation.

/// Squared Euclidean distance and normalisation helpers.
pub mod distance;
/// Dense flat index with exhaustive search and a binary blob format.
pub mod flat;

pub use flat::FlatIndex;

use crate::error::Result;

/// One search hit: row id and squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Row id, equal to the insertion position.
    pub id: usize,
    /// Squared Euclidean distance (lower is closer).
    pub distance: f32,
}

/// Append-only vector storage with exact k-NN search.
///
/// Implementations must:
/// - assign consecutive row ids starting at the current [`len`](Self::len);
/// - reject vectors of the wrong dimension without appending any of the batch;
/// - return search hits ascending by distance, ties broken by lower id;
/// - return an empty list for an empty index, and every row when `k > len`.
pub trait VectorIndex: Send + Sync {
    /// Creates an empty index for vectors of the given dimension.
    fn with_dimension(dimension: usize) -> Self
    where
        Self: Sized;

    /// Fixed vector dimension of this index.
    fn dimension(&self) -> usize;

    /// Number of stored rows.
    fn len(&self) -> usize;

    /// Returns `true` when no rows are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a batch of vectors.
    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()>;

    /// Returns the `k` nearest rows to `query`.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Serializes the index into its opaque binary blob.
    fn to_bytes(&self) -> Vec<u8>;

    /// Restores an index from a blob produced by [`to_bytes`](Self::to_bytes).
    fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}
