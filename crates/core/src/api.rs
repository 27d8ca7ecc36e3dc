//! Boundary contract for an HTTP layer.
//!
//! Request and response bodies are plain JSON: metadata crosses the boundary
//! as JSON objects and is converted to typed [`MetadataValue`](crate::document::MetadataValue)s
//! here. The handlers take a [`SharedRetrieval`] and never touch transport
//! concerns; [`status_code`] maps errors to the HTTP status a server should use.

use crate::config::DEFAULT_TOP_K;
use crate::document::{metadata_from_json, metadata_to_json};
use crate::embedding::EmbeddingProvider;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;
use crate::service::{SearchHit, Stats};
use crate::shared::SharedRetrieval;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Request body for a knowledge search.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub filter_topic: Option<String>,
}

/// One result in a [`SearchResponse`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultBody {
    pub text: String,
    pub score: f32,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl From<SearchHit> for SearchResultBody {
    fn from(hit: SearchHit) -> Self {
        Self {
            metadata: metadata_to_json(&hit.metadata),
            text: hit.text,
            score: hit.score,
        }
    }
}

/// Response body for a knowledge search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultBody>,
}

/// Request body for ingesting passages.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub texts: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Vec<HashMap<String, serde_json::Value>>>,
}

/// Response body for a successful ingest.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub added: usize,
    pub total: usize,
}

/// Response body for store statistics.
pub type StatsResponse = Stats;

/// Error body `{"error": "message"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&RetrievalError> for ErrorResponse {
    fn from(err: &RetrievalError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// HTTP status code a server should answer with for `err`.
///
/// - `Validation` → 400
/// - `Encoding` → 503 (model unavailable)
/// - `Load`, `Index`, `Io` → 500
pub fn status_code(err: &RetrievalError) -> u16 {
    match err {
        RetrievalError::Validation(_) => 400,
        RetrievalError::Encoding(_) => 503,
        RetrievalError::Load(_) | RetrievalError::Index { .. } | RetrievalError::Io(_) => 500,
    }
}

/// Runs a search request.
pub fn search<E: EmbeddingProvider, I: VectorIndex>(
    kb: &SharedRetrieval<E, I>,
    req: SearchRequest,
) -> Result<SearchResponse> {
    let filter = req
        .filter_topic
        .as_deref()
        .filter(|t| !t.trim().is_empty());
    let hits = kb.search(&req.query, req.top_k, filter)?;
    Ok(SearchResponse {
        results: hits.into_iter().map(SearchResultBody::from).collect(),
    })
}

/// Runs an ingest request.
pub fn ingest<E: EmbeddingProvider, I: VectorIndex>(
    kb: &SharedRetrieval<E, I>,
    req: IngestRequest,
) -> Result<IngestResponse> {
    let metadata = req
        .metadata
        .map(|entries| {
            entries
                .into_iter()
                .map(metadata_from_json)
                .collect::<Result<Vec<_>>>()
        })
        .transpose()?;
    kb.with_write(|svc| -> Result<IngestResponse> {
        let added = svc.add_knowledge(req.texts, metadata)?;
        Ok(IngestResponse {
            added,
            total: svc.len(),
        })
    })
}

/// Returns store statistics.
pub fn stats<E: EmbeddingProvider, I: VectorIndex>(kb: &SharedRetrieval<E, I>) -> StatsResponse {
    kb.get_stats()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::embedding::HashingEmbedder;
    use crate::service::RetrievalService;
    use serde_json::json;

    fn kb() -> SharedRetrieval<HashingEmbedder> {
        SharedRetrieval::new(
            RetrievalService::new(HashingEmbedder::new(64), EngineConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_ingest_then_search_json() {
        let kb = kb();
        let req: IngestRequest = serde_json::from_value(json!({
            "texts": ["dry ice makes fog", "yeast is a catalyst"],
            "metadata": [{"topic": "physics"}, {"topic": "chemistry", "age_min": 7}]
        }))
        .unwrap();
        let resp = ingest(&kb, req).unwrap();
        assert_eq!(resp.added, 2);
        assert_eq!(resp.total, 2);

        let req: SearchRequest =
            serde_json::from_value(json!({"query": "catalyst", "filter_topic": "chemistry"}))
                .unwrap();
        assert_eq!(req.top_k, 3);
        let resp = search(&kb, req).unwrap();
        assert_eq!(resp.results.len(), 1);
        let body = serde_json::to_value(&resp).unwrap();
        assert_eq!(body["results"][0]["text"], json!("yeast is a catalyst"));
        assert_eq!(body["results"][0]["metadata"]["topic"], json!("chemistry"));
        assert_eq!(body["results"][0]["metadata"]["age_min"], json!(7.0));
    }

    #[test]
    fn test_ingest_rejects_bad_metadata_kind() {
        let kb = kb();
        let req: IngestRequest = serde_json::from_value(json!({
            "texts": ["slime"],
            "metadata": [{"topic": {"nested": true}}]
        }))
        .unwrap();
        let err = ingest(&kb, req).unwrap_err();
        assert_eq!(status_code(&err), 400);
        assert_eq!(stats(&kb).total_passages, 0);
    }

    #[test]
    fn test_ingest_length_mismatch_is_400() {
        let kb = kb();
        let req: IngestRequest = serde_json::from_value(json!({
            "texts": ["a text", "b text"],
            "metadata": [{}]
        }))
        .unwrap();
        let err = ingest(&kb, req).unwrap_err();
        assert_eq!(status_code(&err), 400);
        assert!(ErrorResponse::from(&err).error.contains("metadata"));
    }

    #[test]
    fn test_blank_filter_topic_is_ignored() {
        let kb = kb();
        kb.add_knowledge(vec!["static electricity".into()], None)
            .unwrap();
        let req: SearchRequest =
            serde_json::from_value(json!({"query": "static", "top_k": 1, "filter_topic": ""}))
                .unwrap();
        assert_eq!(search(&kb, req).unwrap().results.len(), 1);
    }

    #[test]
    fn test_zero_top_k_is_400() {
        let kb = kb();
        let req: SearchRequest =
            serde_json::from_value(json!({"query": "static", "top_k": 0})).unwrap();
        assert_eq!(status_code(&search(&kb, req).unwrap_err()), 400);
    }
}
