//! Document processing pipeline: cleaning, chunking, and orchestration.

pub mod chunking;
pub mod cleaning;
mod service;
pub mod types;

pub use chunking::ChunkPolicy;
pub use service::DocumentProcessor;
pub use types::{
    ChunkingError, DocumentEmbedding, DocumentMetadata, EmbeddingChunk, ProcessingError,
    SearchResult,
};

/// Current timestamp formatted as RFC3339 for persisted metadata.
pub(crate) fn current_timestamp_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
