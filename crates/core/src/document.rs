//! Core passage types for passagedb.
//!
//! A [`Passage`] is the atomic retrievable unit: text plus a small typed
//! metadata map. [`MetadataValue`] is a closed set of value kinds; only a few
//! fixed keys (`topic`, `category`, `name`, age range) are ever read back.

use crate::config::TOPIC_KEY;
use crate::error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A typed metadata value attached to a passage.
///
/// Uses the default externally-tagged serde representation for bincode
/// compatibility. The `api` layer converts to/from plain JSON at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    /// UTF-8 string.
    String(String),
    /// Any numeric value (ages, ratings).
    Number(f64),
    /// List of strings (tags, keywords).
    StringList(Vec<String>),
}

impl MetadataValue {
    /// Returns the inner string for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the inner number for `Number` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts a JSON value. Strings, numbers, and arrays of strings are
    /// accepted; everything else is a validation error.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::String(s) => Ok(MetadataValue::String(s)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(MetadataValue::Number)
                .ok_or_else(|| RetrievalError::validation(format!("unrepresentable number {n}"))),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => Ok(s),
                    other => Err(RetrievalError::validation(format!(
                        "metadata lists may only contain strings, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(MetadataValue::StringList),
            other => Err(RetrievalError::validation(format!(
                "metadata values must be string, number, or string list, got {other}"
            ))),
        }
    }

    /// Converts to a plain JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetadataValue::String(s) => serde_json::Value::String(s.clone()),
            MetadataValue::Number(n) => serde_json::json!(*n),
            MetadataValue::StringList(items) => serde_json::json!(items),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(s: String) -> Self {
        MetadataValue::String(s)
    }
}

impl From<f64> for MetadataValue {
    fn from(n: f64) -> Self {
        MetadataValue::Number(n)
    }
}

impl From<i64> for MetadataValue {
    fn from(n: i64) -> Self {
        MetadataValue::Number(n as f64)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(items: Vec<String>) -> Self {
        MetadataValue::StringList(items)
    }
}

/// Key-value metadata attached to one passage.
pub type Metadata = HashMap<String, MetadataValue>;

/// Returns the `topic` string of a metadata map, if it has one.
pub fn topic_of(metadata: &Metadata) -> Option<&str> {
    metadata.get(TOPIC_KEY).and_then(MetadataValue::as_str)
}

/// Converts a JSON object into typed metadata.
pub fn metadata_from_json(map: HashMap<String, serde_json::Value>) -> Result<Metadata> {
    map.into_iter()
        .map(|(k, v)| MetadataValue::from_json(v).map(|mv| (k, mv)))
        .collect()
}

/// Converts typed metadata into a JSON object.
pub fn metadata_to_json(metadata: &Metadata) -> HashMap<String, serde_json::Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

/// A stored passage as returned by the document store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Passage<'a> {
    /// Dense insertion-order position; equals the vector row id.
    pub position: usize,
    pub text: &'a str,
    pub metadata: &'a Metadata,
}

impl Passage<'_> {
    /// The passage's `topic` metadata, if present and a string.
    pub fn topic(&self) -> Option<&str> {
        topic_of(self.metadata)
    }
}
