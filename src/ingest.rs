//! Upload, search, and lifecycle orchestration over the processing pipeline
//! and the document store.

use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingError, EmbeddingStats};
use crate::extract::{validate_source, ExtractError, SourceFile};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::processing::{DocumentProcessor, ProcessingError, SearchResult};
use crate::search::{SearchError, SearchOptions};
use crate::storage::{DocumentRecord, DocumentStatus, DocumentStore, StorageError};
use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Errors surfaced by the ingestion service.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The upload was rejected before processing started.
    #[error(transparent)]
    Intake(#[from] ExtractError),
    /// The processing pipeline failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),
    /// A storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A search operation failed.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// An embedding operation failed outside the processing pipeline.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

/// Result of a completed ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    /// Identifier assigned to the document.
    pub document_id: String,
    /// Number of chunks embedded and persisted.
    pub total_chunks: usize,
    /// The persisted metadata record.
    pub record: DocumentRecord,
}

/// The operations the HTTP surface depends on.
///
/// Handlers are written against this trait so tests can drive them with a
/// stub instead of a live pipeline.
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Validate, process, and persist one uploaded file.
    async fn ingest_document(
        &self,
        file: SourceFile,
        document_id: Option<String>,
    ) -> Result<IngestOutcome, IngestError>;

    /// Rank stored chunks against a natural-language query.
    async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        score_threshold: Option<f32>,
        include_metadata: bool,
    ) -> Result<Vec<SearchResult>, IngestError>;

    /// Enumerate all persisted document records.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, IngestError>;

    /// Remove a document and everything persisted under it.
    async fn delete_document(&self, document_id: &str) -> Result<(), IngestError>;

    /// Current embedding model statistics.
    fn embedding_stats(&self) -> EmbeddingStats;

    /// Counters accumulated since process start.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Derive a stable document identifier from the upload's bytes.
///
/// The same bytes always map to the same id, so re-uploading a file replaces
/// its previous ingestion instead of duplicating it.
pub fn derive_document_key(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!("doc-{}", &hex::encode(digest)[..16])
}

/// Production implementation of [`IngestApi`] wiring the processor, the
/// document store, and one embedding client together.
pub struct IngestService {
    processor: DocumentProcessor,
    store: DocumentStore,
    client: Box<dyn EmbeddingClient>,
    metrics: Arc<PipelineMetrics>,
    default_top_k: usize,
    default_score_threshold: f32,
}

impl IngestService {
    /// Wire up the service from its collaborators and config defaults.
    pub fn new(
        processor: DocumentProcessor,
        store: DocumentStore,
        client: Box<dyn EmbeddingClient>,
        config: &Config,
    ) -> Self {
        Self {
            processor,
            store,
            client,
            metrics: Arc::new(PipelineMetrics::new()),
            default_top_k: config.search_default_top_k.clamp(1, 100),
            default_score_threshold: config.search_default_score_threshold.clamp(0.0, 1.0),
        }
    }

    fn now_rfc3339() -> String {
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| String::from("unknown"))
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn ingest_document(
        &self,
        file: SourceFile,
        document_id: Option<String>,
    ) -> Result<IngestOutcome, IngestError> {
        validate_source(&file)?;
        let document_id = document_id.unwrap_or_else(|| derive_document_key(&file.bytes));

        let mut record = DocumentRecord {
            original_file_name: file.file_name.clone(),
            document_id: document_id.clone(),
            file_size: file.bytes.len(),
            mime_type: file.mime_type.clone(),
            uploaded_at: Self::now_rfc3339(),
            status: DocumentStatus::Processing,
            has_embeddings: false,
        };
        self.store.save_record(&record).await?;

        match self
            .processor
            .process_with_text(&file, &document_id, self.client.as_ref(), None)
            .await
        {
            Ok(processed) => {
                record.status = DocumentStatus::Ready;
                record.has_embeddings = true;
                self.store
                    .save_document(&processed.embedding, &processed.extracted_text, &record)
                    .await?;
                let total_chunks = processed.embedding.chunks.len();
                self.metrics.record_document(total_chunks as u64);
                Ok(IngestOutcome {
                    document_id,
                    total_chunks,
                    record,
                })
            }
            Err(error) => {
                record.status = DocumentStatus::Error;
                if let Err(save_error) = self.store.save_record(&record).await {
                    tracing::warn!(
                        document_id,
                        error = %save_error,
                        "Failed to persist error status for document"
                    );
                }
                Err(error.into())
            }
        }
    }

    async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        score_threshold: Option<f32>,
        include_metadata: bool,
    ) -> Result<Vec<SearchResult>, IngestError> {
        let options = SearchOptions {
            top_k: top_k.unwrap_or(self.default_top_k).clamp(1, 100),
            threshold: score_threshold
                .unwrap_or(self.default_score_threshold)
                .clamp(0.0, 1.0),
            include_metadata,
        };
        let documents = self.store.load_all_embeddings().await?;
        let results = self
            .processor
            .search_documents(query, &documents, self.client.as_ref(), &options)
            .await?;
        self.metrics.record_search();
        Ok(results)
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, IngestError> {
        Ok(self.store.list_records().await?)
    }

    async fn delete_document(&self, document_id: &str) -> Result<(), IngestError> {
        Ok(self.store.delete_document(document_id).await?)
    }

    fn embedding_stats(&self) -> EmbeddingStats {
        self.processor.embedding_stats()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
