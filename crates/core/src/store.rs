//! Passage text and metadata, position-aligned with the vector index.
//!
//! The store keeps two parallel sequences, `documents` and `metadata`, which
//! is also the persisted shape. Position `i` here is row `i` in the index;
//! callers append to both as one logical operation.

use crate::config::UNKNOWN_TOPIC;
use crate::document::{topic_of, Metadata, Passage};
use crate::error::{Result, RetrievalError};
use std::collections::BTreeSet;

/// Append-only passage store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    documents: Vec<String>,
    metadata: Vec<Metadata>,
}

impl DocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from its two parallel sequences.
    ///
    /// Fails with [`RetrievalError::Load`] if their lengths differ, since that
    /// can only come from a damaged artifact.
    pub fn from_parts(documents: Vec<String>, metadata: Vec<Metadata>) -> Result<Self> {
        if documents.len() != metadata.len() {
            return Err(RetrievalError::load(format!(
                "documents ({}) and metadata ({}) lengths differ",
                documents.len(),
                metadata.len()
            )));
        }
        Ok(Self {
            documents,
            metadata,
        })
    }

    /// Appends a passage and returns its position.
    pub fn append(&mut self, text: String, metadata: Metadata) -> usize {
        let position = self.documents.len();
        self.documents.push(text);
        self.metadata.push(metadata);
        position
    }

    /// Returns the passage at `position`.
    pub fn get(&self, position: usize) -> Result<Passage<'_>> {
        match (self.documents.get(position), self.metadata.get(position)) {
            (Some(text), Some(metadata)) => Ok(Passage {
                position,
                text,
                metadata,
            }),
            _ => Err(RetrievalError::Index {
                position,
                len: self.len(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The stored texts, in position order.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// The stored metadata maps, in position order.
    pub fn metadata(&self) -> &[Metadata] {
        &self.metadata
    }

    /// Iterates passages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Passage<'_>> {
        self.documents
            .iter()
            .zip(&self.metadata)
            .enumerate()
            .map(|(position, (text, metadata))| Passage {
                position,
                text,
                metadata,
            })
    }

    /// Sorted distinct `topic` values. Passages without a string topic count
    /// as [`UNKNOWN_TOPIC`].
    pub fn topics(&self) -> Vec<String> {
        self.metadata
            .iter()
            .map(|m| topic_of(m).unwrap_or(UNKNOWN_TOPIC))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MetadataValue;

    fn meta(topic: &str) -> Metadata {
        let mut m = Metadata::new();
        m.insert("topic".into(), MetadataValue::String(topic.into()));
        m
    }

    #[test]
    fn test_append_returns_positions() {
        let mut store = DocumentStore::new();
        assert_eq!(store.append("a".into(), Metadata::new()), 0);
        assert_eq!(store.append("b".into(), meta("physics")), 1);
        assert_eq!(store.len(), 2);
        let p = store.get(1).unwrap();
        assert_eq!(p.position, 1);
        assert_eq!(p.text, "b");
        assert_eq!(p.topic(), Some("physics"));
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = DocumentStore::new();
        store.append("only".into(), Metadata::new());
        match store.get(1) {
            Err(RetrievalError::Index { position, len }) => {
                assert_eq!(position, 1);
                assert_eq!(len, 1);
            }
            other => panic!("expected Index error, got {other:?}"),
        }
    }

    #[test]
    fn test_topics_sorted_distinct() {
        let mut store = DocumentStore::new();
        store.append("1".into(), meta("physics"));
        store.append("2".into(), meta("chemistry"));
        store.append("3".into(), Metadata::new());
        store.append("4".into(), meta("physics"));
        assert_eq!(store.topics(), vec!["chemistry", "physics", "unknown"]);
    }

    #[test]
    fn test_untagged_only_store_reports_unknown() {
        let mut store = DocumentStore::new();
        assert!(store.topics().is_empty());
        let mut numeric = Metadata::new();
        numeric.insert("topic".into(), MetadataValue::Number(3.0));
        store.append("a".into(), Metadata::new());
        store.append("b".into(), numeric);
        assert_eq!(store.topics(), vec![UNKNOWN_TOPIC]);
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let err = DocumentStore::from_parts(vec!["a".into()], vec![]).unwrap_err();
        assert!(matches!(err, RetrievalError::Load(_)));
    }

    #[test]
    fn test_iter_in_insertion_order() {
        let mut store = DocumentStore::new();
        for t in ["x", "y", "z"] {
            store.append(t.into(), Metadata::new());
        }
        let texts: Vec<&str> = store.iter().map(|p| p.text).collect();
        assert_eq!(texts, vec!["x", "y", "z"]);
    }
}
