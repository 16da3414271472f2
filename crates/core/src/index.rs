//! Vector index abstraction.
//!
//! Namespaced storage for embedded text chunks plus a content hash per
//! namespace, used by ingestion to skip re-indexing unchanged documents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// A chunk stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Stable ID; upserting the same ID replaces the record
    pub id: String,

    /// The chunk text
    pub text: String,

    /// Embedding vector
    pub embedding: Vec<f32>,

    /// Where the chunk came from (file name, URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A namespaced vector store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records in a namespace.
    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<(), IndexError>;

    /// Nearest-neighbour search over a namespace.
    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError>;

    /// The content hash recorded for a namespace, if any.
    async fn content_hash(&self, namespace: &str) -> Result<Option<String>, IndexError>;

    /// Record the content hash for a namespace.
    async fn set_content_hash(&self, namespace: &str, hash: &str) -> Result<(), IndexError>;
}
