//! Stateless orchestration of the ingestion pipeline.

use super::chunking::{ChunkPolicy, create_embedding_chunks, create_semantic_chunks};
use super::cleaning::clean_content;
use super::current_timestamp_rfc3339;
use super::types::{DocumentEmbedding, DocumentMetadata, ProcessingError};
use crate::embedding::{
    EmbeddingClient, EmbeddingConfig, EmbeddingService, EmbeddingStats, ProgressCallback,
};
use crate::extract::{ContentExtractor, SourceFile};
use crate::processing::SearchResult;
use crate::search::{SearchError, SearchOptions, SimilaritySearchService};

/// Orchestrates extraction, cleaning, chunking, and embedding into a complete
/// [`DocumentEmbedding`].
///
/// The processor holds no cross-call state: each `process_document` invocation
/// is independent and safely repeatable, and persistence is the caller's
/// responsibility.
pub struct DocumentProcessor {
    extractor: Box<dyn ContentExtractor>,
    embedding: EmbeddingService,
    search: SimilaritySearchService,
    chunk_policy: ChunkPolicy,
}

/// A processed document together with the extracted text the upload flow
/// persists alongside it.
pub(crate) struct ProcessedDocument {
    pub(crate) embedding: DocumentEmbedding,
    pub(crate) extracted_text: String,
}

impl DocumentProcessor {
    /// Build a processor over the supplied collaborators.
    pub fn new(
        extractor: Box<dyn ContentExtractor>,
        embedding: EmbeddingService,
        chunk_policy: ChunkPolicy,
    ) -> Self {
        Self {
            extractor,
            embedding,
            search: SimilaritySearchService::new(),
            chunk_policy,
        }
    }

    /// Run the full ingestion pipeline for one uploaded file.
    ///
    /// Fails fast with [`ProcessingError::EmptyDocument`] when cleaning and
    /// chunking yield nothing usable, before any embedding call is attempted.
    pub async fn process_document(
        &self,
        file: &SourceFile,
        document_id: &str,
        client: &dyn EmbeddingClient,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<DocumentEmbedding, ProcessingError> {
        Ok(self
            .process_with_text(file, document_id, client, on_progress)
            .await?
            .embedding)
    }

    /// Pipeline variant that also hands back the extracted text for
    /// persistence by the upload flow.
    pub(crate) async fn process_with_text(
        &self,
        file: &SourceFile,
        document_id: &str,
        client: &dyn EmbeddingClient,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<ProcessedDocument, ProcessingError> {
        tracing::info!(file = %file.file_name, document_id, "Processing document");

        let extracted = self.extractor.extract(file).await?;
        let cleaned = clean_content(&extracted);
        let chunks = create_semantic_chunks(&cleaned, &self.chunk_policy);
        if chunks.is_empty() {
            tracing::warn!(file = %file.file_name, "Document produced no usable chunks");
            return Err(ProcessingError::EmptyDocument {
                file_name: file.file_name.clone(),
            });
        }

        let embeddings = self
            .embedding
            .generate_batch_embeddings(&chunks, client, on_progress)
            .await?;
        debug_assert_eq!(chunks.len(), embeddings.len());

        let total_characters = cleaned.chars().count();
        let chunk_records = create_embedding_chunks(chunks, embeddings)?;
        let metadata = DocumentMetadata {
            file_name: file.file_name.clone(),
            file_type: file.mime_type.clone(),
            total_chunks: chunk_records.len(),
            chunk_size: self.chunk_policy.target_size,
            processed_at: current_timestamp_rfc3339(),
            total_characters,
            avg_chunk_size: mean_chunk_size(&chunk_records),
            embedding_model: self.embedding.config().model,
        };

        tracing::info!(
            file = %file.file_name,
            document_id,
            chunks = metadata.total_chunks,
            total_characters,
            "Document processed"
        );

        Ok(ProcessedDocument {
            embedding: DocumentEmbedding {
                document_id: document_id.to_string(),
                chunks: chunk_records,
                metadata,
            },
            extracted_text: extracted,
        })
    }

    /// Rank stored chunks against a natural-language query.
    pub async fn search_documents(
        &self,
        query: &str,
        documents: &[DocumentEmbedding],
        client: &dyn EmbeddingClient,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        self.search
            .search_similar_chunks(query, documents, client, &self.embedding, options)
            .await
    }

    /// Replace the embedding configuration (safe only between operations).
    pub fn set_embedding_config(&self, config: EmbeddingConfig) {
        self.embedding.set_config(config);
    }

    /// Current embedding model statistics.
    pub fn embedding_stats(&self) -> EmbeddingStats {
        self.embedding.stats()
    }
}

fn mean_chunk_size(chunks: &[super::types::EmbeddingChunk]) -> usize {
    if chunks.is_empty() {
        return 0;
    }
    let total: usize = chunks.iter().map(|chunk| chunk.char_count).sum();
    ((total as f64) / (chunks.len() as f64)).round() as usize
}
