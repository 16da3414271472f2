//! # Doppel Ingest
//!
//! Turns the owner's profile document into indexed chunks: hash, chunk,
//! embed, upsert. Ingestion is idempotent on content: an unchanged document
//! is detected by its hash and skipped entirely, so restarts never re-embed
//! or touch the index for the same text.

pub mod chunker;
pub mod hash;

use std::sync::Arc;

use doppel_core::error::{Error, ToolError};
use doppel_core::index::IndexRecord;
use doppel_core::provider::{EmbeddingRequest, Provider};
use doppel_core::VectorIndex;
use tracing::info;

pub const DEFAULT_CHUNK_SIZE: usize = 200;
pub const DEFAULT_OVERLAP: usize = 25;

/// What an ingestion run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// True when the document hash matched and nothing was touched
    pub skipped: bool,
    /// Number of chunks written (zero when skipped)
    pub chunks: usize,
}

/// Ingests profile documents into a namespace.
pub struct Ingestor {
    provider: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    namespace: String,
    embed_model: String,
    chunk_size: usize,
    overlap: usize,
}

impl Ingestor {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        namespace: impl Into<String>,
        embed_model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            index,
            namespace: namespace.into(),
            embed_model: embed_model.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    /// Ingest one document. `source` labels the chunks (e.g. the file name).
    pub async fn ingest(&self, text: &str, source: Option<&str>) -> Result<IngestReport, Error> {
        let hash = hash::content_hash(text);

        if self.index.content_hash(&self.namespace).await? == Some(hash.clone()) {
            info!(namespace = %self.namespace, "Document unchanged, skipping ingestion");
            return Ok(IngestReport {
                skipped: true,
                chunks: 0,
            });
        }

        let chunks = chunker::split_text(text, self.chunk_size, self.overlap);
        if chunks.is_empty() {
            self.index.set_content_hash(&self.namespace, &hash).await?;
            return Ok(IngestReport {
                skipped: false,
                chunks: 0,
            });
        }

        let embeddings = self
            .provider
            .embed(EmbeddingRequest {
                model: self.embed_model.clone(),
                inputs: chunks.clone(),
            })
            .await
            .map_err(Error::from)?;

        if embeddings.embeddings.len() != chunks.len() {
            return Err(Error::Tool(ToolError::ExecutionFailed {
                tool_name: "ingest".into(),
                reason: format!(
                    "embedding count {} does not match chunk count {}",
                    embeddings.embeddings.len(),
                    chunks.len()
                ),
            }));
        }

        let records: Vec<IndexRecord> = chunks
            .into_iter()
            .zip(embeddings.embeddings)
            .enumerate()
            .map(|(i, (text, embedding))| IndexRecord {
                id: format!("chunk-{i}"),
                text,
                embedding,
                source: source.map(String::from),
            })
            .collect();

        let count = records.len();
        self.index.upsert(&self.namespace, records).await?;
        self.index.set_content_hash(&self.namespace, &hash).await?;

        info!(namespace = %self.namespace, chunks = count, "Document ingested");
        Ok(IngestReport {
            skipped: false,
            chunks: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use doppel_core::error::ProviderError;
    use doppel_core::provider::{
        EmbeddingResponse, ProviderRequest, ProviderResponse,
    };
    use doppel_index::InMemoryIndex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Provider for CountingEmbedder {
        fn name(&self) -> &str {
            "counting"
        }

        async fn complete(
            &self,
            _: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("chat not used here".into()))
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmbeddingResponse {
                embeddings: request
                    .inputs
                    .iter()
                    .map(|s| vec![s.chars().count() as f32, 1.0])
                    .collect(),
                model: "counting-embed".into(),
            })
        }
    }

    fn setup() -> (Arc<CountingEmbedder>, Arc<InMemoryIndex>, Ingestor) {
        let provider = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let index = Arc::new(InMemoryIndex::new());
        let ingestor = Ingestor::new(
            Arc::clone(&provider) as Arc<dyn Provider>,
            Arc::clone(&index) as Arc<dyn VectorIndex>,
            "profile",
            "embed-model",
        )
        .with_chunking(60, 15);
        (provider, index, ingestor)
    }

    #[tokio::test]
    async fn first_ingestion_writes_chunks() {
        let (_, index, ingestor) = setup();
        let text = "Aayushmaan studied computer science and now builds agents. ".repeat(5);

        let report = ingestor.ingest(&text, Some("profile.md")).await.unwrap();
        assert!(!report.skipped);
        assert!(report.chunks > 1);
        assert_eq!(index.record_count("profile").await, report.chunks);
    }

    #[tokio::test]
    async fn unchanged_document_is_skipped_with_zero_writes() {
        let (provider, index, ingestor) = setup();
        let text = "Aayushmaan studied computer science and now builds agents. ".repeat(5);

        ingestor.ingest(&text, None).await.unwrap();
        let upserts_before = index.upsert_call_count();
        let embeds_before = provider.calls.load(Ordering::SeqCst);

        let report = ingestor.ingest(&text, None).await.unwrap();
        assert!(report.skipped);
        assert_eq!(report.chunks, 0);
        assert_eq!(index.upsert_call_count(), upserts_before);
        assert_eq!(provider.calls.load(Ordering::SeqCst), embeds_before);
    }

    #[tokio::test]
    async fn changed_document_is_reingested() {
        let (_, index, ingestor) = setup();

        ingestor.ingest("version one of the profile text here", None).await.unwrap();
        let report = ingestor
            .ingest("version two, now with different content entirely", None)
            .await
            .unwrap();

        assert!(!report.skipped);
        assert_eq!(
            index.content_hash("profile").await.unwrap().unwrap(),
            hash::content_hash("version two, now with different content entirely")
        );
    }

    #[tokio::test]
    async fn empty_document_records_hash_only() {
        let (provider, index, ingestor) = setup();

        let report = ingestor.ingest("", None).await.unwrap();
        assert!(!report.skipped);
        assert_eq!(report.chunks, 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(index.content_hash("profile").await.unwrap().is_some());
    }
}
