//! Core data types and error definitions for the processing pipeline.

use crate::embedding::EmbeddingError;
use crate::extract::ExtractError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while assembling chunk records.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Chunk texts and embedding vectors were supplied with different lengths.
    #[error("chunk/embedding count mismatch: {chunks} chunks, {embeddings} embeddings")]
    MisalignedEmbeddings {
        /// Number of chunk texts supplied.
        chunks: usize,
        /// Number of embedding vectors supplied.
        embeddings: usize,
    },
}

/// Errors emitted by the document processing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The source file could not be converted to text.
    #[error("Failed to extract content: {0}")]
    Extraction(#[from] ExtractError),
    /// Cleaning and chunking yielded zero usable chunks.
    #[error("no valid chunks created from '{file_name}'")]
    EmptyDocument {
        /// Name of the degenerate document.
        file_name: String,
    },
    /// Embedding provider failed to produce vectors for the chunk texts.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Chunk texts and embedding vectors could not be zipped.
    #[error("Failed to assemble chunks: {0}")]
    Chunking(#[from] ChunkingError),
}

/// A bounded span of cleaned document text together with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingChunk {
    /// The chunk's text content.
    pub content: String,
    /// Zero-based position among chunks of the same document.
    pub index: usize,
    /// Embedding vector produced for the chunk.
    pub embedding: Vec<f32>,
    /// Whitespace-split token count of `content`.
    pub word_count: usize,
    /// Character count of `content`.
    pub char_count: usize,
}

/// Metadata derived from a single chunking/embedding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Original file name of the source document.
    pub file_name: String,
    /// MIME type of the source document.
    pub file_type: String,
    /// Number of chunks produced.
    pub total_chunks: usize,
    /// Nominal chunk size target used for the run (not an enforced maximum).
    pub chunk_size: usize,
    /// RFC3339 timestamp of when processing completed.
    pub processed_at: String,
    /// Character count of the cleaned document text.
    pub total_characters: usize,
    /// Mean chunk character count, rounded to the nearest integer.
    pub avg_chunk_size: usize,
    /// Embedding model identifier used for the run.
    pub embedding_model: String,
}

/// The complete, immutable embedding record for one ingested document.
///
/// Created once per successful ingestion and replaced wholesale on
/// re-ingestion; there is no partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEmbedding {
    /// Caller-supplied identifier, stable for the document's lifetime.
    pub document_id: String,
    /// Ordered chunk records; order is the chunk index.
    pub chunks: Vec<EmbeddingChunk>,
    /// Metadata derived from the processing run.
    pub metadata: DocumentMetadata,
}

/// A scored chunk returned from a similarity search. Ephemeral: computed per
/// query, never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: EmbeddingChunk,
    /// Cosine similarity of the chunk against the query, in `[-1, 1]`.
    pub score: f32,
    /// Identifier of the document the chunk belongs to.
    pub document_id: String,
    /// Source file name, attached when metadata is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// 1-based position in the sorted, truncated result list.
    pub rank: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_embedding_round_trips_camel_case_json() {
        let embedding = DocumentEmbedding {
            document_id: "doc-1".into(),
            chunks: vec![EmbeddingChunk {
                content: "Example text.".into(),
                index: 0,
                embedding: vec![0.1, 0.2],
                word_count: 2,
                char_count: 13,
            }],
            metadata: DocumentMetadata {
                file_name: "example.txt".into(),
                file_type: "text/plain".into(),
                total_chunks: 1,
                chunk_size: 300,
                processed_at: "2026-01-01T00:00:00Z".into(),
                total_characters: 13,
                avg_chunk_size: 13,
                embedding_model: "text-embedding-3-small".into(),
            },
        };

        let json = serde_json::to_value(&embedding).expect("serialize");
        assert_eq!(json["documentId"], "doc-1");
        assert_eq!(json["chunks"][0]["wordCount"], 2);
        assert_eq!(json["metadata"]["avgChunkSize"], 13);

        let parsed: DocumentEmbedding = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed.chunks[0].content, "Example text.");
        assert_eq!(parsed.metadata.total_chunks, 1);
    }
}
