//! Dense flat index with exhaustive squared-L2 search.
//!
//! All rows live in one contiguous `Vec<f32>` arena (`len * dimension`
//! floats). Search scans every row and keeps the best `k` in a bounded
//! max-heap keyed by `(distance, id)`, so equal distances resolve to the
//! earlier insertion.
//!
//! Blob layout: `[magic "PDBI"][u32 version LE][u32 dimension LE]
//! [u64 rows LE][rows * dimension f32 LE]`.

use crate::config;
use crate::error::{Result, RetrievalError};
use crate::index::distance::euclidean_sq;
use crate::index::{Neighbor, VectorIndex};
use ordered_float::OrderedFloat;
use std::collections::BinaryHeap;

const BLOB_MAGIC: &[u8; 4] = b"PDBI";
const BLOB_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// Heap entry ordered by `(distance, id)`; the heap top is the worst kept hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ResultEntry {
    distance: OrderedFloat<f32>,
    id: usize,
}

/// Dense append-only vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    /// Creates an empty index.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            data: Vec::new(),
        }
    }

    /// Returns row `id`, or `None` if out of range.
    pub fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    fn check_dimension(&self, v: &[f32], what: &str) -> Result<()> {
        if v.len() != self.dimension {
            return Err(RetrievalError::validation(format!(
                "{what} has dimension {}, index expects {}",
                v.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn with_dimension(dimension: usize) -> Self {
        Self::new(dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        for (i, v) in vectors.iter().enumerate() {
            self.check_dimension(v, &format!("vector {i}"))?;
            if v.iter().any(|x| !x.is_finite()) {
                return Err(RetrievalError::validation(format!(
                    "vector {i} contains non-finite values"
                )));
            }
        }
        self.data.reserve(vectors.len() * self.dimension);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        self.check_dimension(query, "query")?;
        let n = self.len();
        if n == 0 || k == 0 {
            return Ok(Vec::new());
        }
        let k = k.min(n);

        let mut heap: BinaryHeap<ResultEntry> = BinaryHeap::with_capacity(k + 1);
        for (id, row) in self.data.chunks_exact(self.dimension).enumerate() {
            let entry = ResultEntry {
                distance: OrderedFloat(euclidean_sq(query, row)),
                id,
            };
            if heap.len() < k {
                heap.push(entry);
            } else if heap.peek().is_some_and(|worst| entry < *worst) {
                heap.pop();
                heap.push(entry);
            }
        }

        Ok(heap
            .into_sorted_vec()
            .into_iter()
            .map(|e| Neighbor {
                id: e.id,
                distance: e.distance.0,
            })
            .collect())
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        out.extend_from_slice(BLOB_MAGIC);
        out.extend_from_slice(&BLOB_VERSION.to_le_bytes());
        out.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        out.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for x in &self.data {
            out.extend_from_slice(&x.to_le_bytes());
        }
        out
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(RetrievalError::load(format!(
                "index blob truncated: {} bytes, header needs {HEADER_LEN}",
                bytes.len()
            )));
        }
        if &bytes[0..4] != BLOB_MAGIC {
            return Err(RetrievalError::load("index blob has wrong magic bytes"));
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != BLOB_VERSION {
            return Err(RetrievalError::load(format!(
                "unsupported index blob version {version}"
            )));
        }
        let dimension = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        let mut rows_buf = [0u8; 8];
        rows_buf.copy_from_slice(&bytes[12..20]);
        let rows = u64::from_le_bytes(rows_buf);

        if dimension == 0 || dimension > config::MAX_DIMENSION {
            return Err(RetrievalError::load(format!(
                "index blob dimension {dimension} out of range"
            )));
        }
        let expected = usize::try_from(rows)
            .ok()
            .and_then(|r| r.checked_mul(dimension))
            .and_then(|f| f.checked_mul(4))
            .ok_or_else(|| RetrievalError::load("index blob row count overflows"))?;
        let payload = &bytes[HEADER_LEN..];
        if payload.len() != expected {
            return Err(RetrievalError::load(format!(
                "index blob payload is {} bytes, header declares {expected}",
                payload.len()
            )));
        }

        let data = payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { dimension, data })
    }
}
