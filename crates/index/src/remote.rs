//! Client for a hosted vector store.
//!
//! Speaks a small JSON API: upsert and query per namespace, plus a metadata
//! document holding the content hash used for ingestion skip detection.

use async_trait::async_trait;
use doppel_core::error::IndexError;
use doppel_core::index::{IndexRecord, ScoredChunk, VectorIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A remote vector index behind an HTTP API.
pub struct RemoteIndex {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl RemoteIndex {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    records: &'a [IndexRecord],
}

#[derive(Serialize)]
struct QueryBody<'a> {
    embedding: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    chunks: Vec<ScoredChunk>,
}

#[derive(Serialize, Deserialize)]
struct MetaDocument {
    #[serde(default)]
    content_hash: Option<String>,
}

#[async_trait]
impl VectorIndex for RemoteIndex {
    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<(), IndexError> {
        let url = format!("{}/vectors/{namespace}/upsert", self.base_url);
        debug!(namespace, count = records.len(), "Upserting records");

        let response = self
            .request(self.client.post(&url))
            .json(&UpsertBody { records: &records })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexError::Storage(format!(
                "upsert failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let url = format!("{}/vectors/{namespace}/query", self.base_url);

        let response = self
            .request(self.client.post(&url))
            .json(&QueryBody { embedding, top_k })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexError::Storage(format!(
                "query failed with status {}",
                response.status()
            )));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::Storage(format!("bad query response: {e}")))?;
        Ok(body.chunks)
    }

    async fn content_hash(&self, namespace: &str) -> Result<Option<String>, IndexError> {
        let url = format!("{}/vectors/{namespace}/meta", self.base_url);

        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(IndexError::Storage(format!(
                "meta fetch failed with status {}",
                response.status()
            )));
        }

        let meta: MetaDocument = response
            .json()
            .await
            .map_err(|e| IndexError::Storage(format!("bad meta response: {e}")))?;
        Ok(meta.content_hash)
    }

    async fn set_content_hash(&self, namespace: &str, hash: &str) -> Result<(), IndexError> {
        let url = format!("{}/vectors/{namespace}/meta", self.base_url);

        let response = self
            .request(self.client.put(&url))
            .json(&MetaDocument {
                content_hash: Some(hash.to_string()),
            })
            .send()
            .await
            .map_err(|e| IndexError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IndexError::Storage(format!(
                "meta update failed with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
