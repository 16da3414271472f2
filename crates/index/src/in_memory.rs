//! In-process vector index.
//!
//! Cosine similarity over namespaced records held in a RwLock'd map.
//! Default backend when no remote index URL is configured; also the
//! workhorse for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use doppel_core::error::IndexError;
use doppel_core::index::{IndexRecord, ScoredChunk, VectorIndex};
use tokio::sync::RwLock;

#[derive(Default)]
struct NamespaceData {
    records: HashMap<String, IndexRecord>,
    content_hash: Option<String>,
}

/// An in-memory vector index. Cheap to clone behind an Arc.
#[derive(Default)]
pub struct InMemoryIndex {
    namespaces: RwLock<HashMap<String, NamespaceData>>,
    upsert_calls: AtomicUsize,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored in a namespace.
    pub async fn record_count(&self, namespace: &str) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map(|ns| ns.records.len())
            .unwrap_or(0)
    }

    /// How many upsert calls have been made, across all namespaces.
    pub fn upsert_call_count(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(&self, namespace: &str, records: Vec<IndexRecord>) -> Result<(), IndexError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            ns.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn search(
        &self,
        namespace: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let namespaces = self.namespaces.read().await;
        let Some(ns) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredChunk> = ns
            .records
            .values()
            .map(|r| ScoredChunk {
                text: r.text.clone(),
                score: cosine_similarity(embedding, &r.embedding),
                source: r.source.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn content_hash(&self, namespace: &str) -> Result<Option<String>, IndexError> {
        Ok(self
            .namespaces
            .read()
            .await
            .get(namespace)
            .and_then(|ns| ns.content_hash.clone()))
    }

    async fn set_content_hash(&self, namespace: &str, hash: &str) -> Result<(), IndexError> {
        let mut namespaces = self.namespaces.write().await;
        let ns = namespaces.entry(namespace.to_string()).or_default();
        ns.content_hash = Some(hash.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            text: text.into(),
            embedding,
            source: None,
        }
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let index = InMemoryIndex::new();
        index
            .upsert(
                "profile",
                vec![
                    record("a", "likes rust", vec![1.0, 0.0]),
                    record("b", "likes tea", vec![0.0, 1.0]),
                    record("c", "likes systems", vec![0.9, 0.1]),
                ],
            )
            .await
            .unwrap();

        let hits = index.search("profile", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "likes rust");
        assert_eq!(hits[1].text, "likes systems");
    }

    #[tokio::test]
    async fn upsert_replaces_by_id() {
        let index = InMemoryIndex::new();
        index
            .upsert("profile", vec![record("a", "old", vec![1.0])])
            .await
            .unwrap();
        index
            .upsert("profile", vec![record("a", "new", vec![1.0])])
            .await
            .unwrap();

        assert_eq!(index.record_count("profile").await, 1);
        let hits = index.search("profile", &[1.0], 1).await.unwrap();
        assert_eq!(hits[0].text, "new");
    }

    #[tokio::test]
    async fn unknown_namespace_is_empty() {
        let index = InMemoryIndex::new();
        let hits = index.search("missing", &[1.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn content_hash_roundtrip() {
        let index = InMemoryIndex::new();
        assert_eq!(index.content_hash("profile").await.unwrap(), None);

        index.set_content_hash("profile", "abc123").await.unwrap();
        assert_eq!(
            index.content_hash("profile").await.unwrap().as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
