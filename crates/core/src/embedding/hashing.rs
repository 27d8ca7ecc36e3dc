//! Feature-hashing embedder.
//!
//! Lowercases the text, splits on non-alphanumeric characters, drops common
//! stopwords and single-character tokens, then hashes each remaining token
//! into one of `dimension` buckets with a ±1 sign. The count vector is
//! L2-normalised, so squared L2 between two embeddings is `2 - 2·cos`.
//!
//! Short questions such as "Why?" or "what is it?" have no terms left after
//! filtering. Those texts are hashed from every lowercase alphanumeric token
//! instead, single characters and stopwords included. A text with no
//! alphanumeric characters at all (only punctuation or symbols) embeds to the
//! zero vector, which is equidistant from every unit vector, so searches with
//! it rank by insertion order.
//!
//! Hashing uses CRC32, whose output is fixed by the algorithm, so vectors
//! persisted by one build compare correctly against queries from another.
//! Batches are encoded on the rayon pool.

use crate::config::DEFAULT_DIMENSION;
use crate::embedding::{reject_blank, EmbeddingProvider};
use crate::error::Result;
use crate::index::distance::normalize;
use rayon::prelude::*;

const MODEL_NAME: &str = "feature-hashing-v1";
const SIGN_SEED: u32 = 0x9E37_79B9;

const STOPWORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "how", "in", "is", "it", "its", "of", "on", "or", "so", "that", "the", "this", "to", "up",
    "was", "what", "when", "which", "why", "with", "you", "your",
];

/// Deterministic bag-of-words embedder. Needs no model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashingEmbedder {
    /// Creates an embedder producing `dimension`-length vectors.
    ///
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be positive");
        Self { dimension }
    }

    fn raw_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        Self::raw_tokens(text)
            .filter(|t| t.chars().count() > 1)
            .filter(|t| !STOPWORDS.contains(&t.as_str()))
    }

    fn hash_into(&self, v: &mut [f32], tokens: impl Iterator<Item = String>) -> usize {
        let mut seen = 0usize;
        for token in tokens {
            let bytes = token.as_bytes();
            let bucket = crc32fast::hash(bytes) as usize % self.dimension;
            let mut signer = crc32fast::Hasher::new_with_initial(SIGN_SEED);
            signer.update(bytes);
            let sign = if signer.finalize() & 1 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
            seen += 1;
        }
        seen
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        if self.hash_into(&mut v, Self::tokens(text)) == 0 {
            self.hash_into(&mut v, Self::raw_tokens(text));
        }
        // normalize leaves an all-zero vector as is.
        normalize(&mut v);
        v
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        reject_blank(texts)?;
        Ok(texts.par_iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::index::distance::{euclidean_sq, norm_sq};

    #[test]
    fn test_dimension_and_unit_norm() {
        let e = HashingEmbedder::default();
        let v = e.encode("Dry ice sublimates into fog").unwrap();
        assert_eq!(v.len(), 384);
        assert!((norm_sq(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let e = HashingEmbedder::new(64);
        let a = e.encode("static electricity and balloons").unwrap();
        let b = e.encode("static electricity and balloons").unwrap();
        assert_eq!(a, b);
        let batch = e
            .encode_batch(&["static electricity and balloons".into()])
            .unwrap();
        assert_eq!(batch[0], a);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let e = HashingEmbedder::new(128);
        assert_eq!(
            e.encode("Catalyst, REACTION!").unwrap(),
            e.encode("catalyst reaction").unwrap()
        );
    }

    #[test]
    fn test_shared_terms_are_closer() {
        let e = HashingEmbedder::default();
        let q = e.encode("how does a catalyst speed a reaction").unwrap();
        let near = e.encode("a catalyst makes a reaction faster").unwrap();
        let far = e.encode("balloons rubbed on hair gain static charge").unwrap();
        assert!(euclidean_sq(&q, &near) < euclidean_sq(&q, &far));
    }

    #[test]
    fn test_blank_rejected() {
        let e = HashingEmbedder::new(8);
        assert!(matches!(e.encode(""), Err(RetrievalError::Encoding(_))));
        assert!(matches!(e.encode("   "), Err(RetrievalError::Encoding(_))));
    }

    #[test]
    fn test_only_stopwords_falls_back_to_raw_terms() {
        let e = HashingEmbedder::new(64);
        let v = e.encode("what is it?").unwrap();
        assert!((norm_sq(&v) - 1.0).abs() < 1e-5);
        assert_eq!(v, e.encode("What IS it").unwrap());
        assert_ne!(v, e.encode("why?").unwrap());

        let x = e.encode("x").unwrap();
        assert!((norm_sq(&x) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_punctuation_only_is_zero_vector() {
        let e = HashingEmbedder::new(16);
        let v = e.encode("?!").unwrap();
        assert_eq!(v, vec![0.0; 16]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let e = HashingEmbedder::new(32);
        let texts: Vec<String> = ["slime polymer", "dry ice fog", "lightning static"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let batch = e.encode_batch(&texts).unwrap();
        for (t, v) in texts.iter().zip(&batch) {
            assert_eq!(&e.encode(t).unwrap(), v);
        }
    }
}
