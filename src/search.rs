//! Cosine similarity search over stored document embeddings.

use crate::embedding::{EmbeddingClient, EmbeddingError, EmbeddingService};
use crate::processing::{DocumentEmbedding, SearchResult};
use thiserror::Error;

/// Errors emitted while orchestrating similarity searches.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Embedding provider failed to return a vector for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Compared vectors have unequal length, indicating an embedding-model
    /// mismatch between query and stored chunks.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the query vector.
        expected: usize,
        /// Dimensionality of the stored chunk vector.
        actual: usize,
    },
}

/// Options controlling result filtering and shaping.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of results returned.
    pub top_k: usize,
    /// Minimum similarity score surfaced.
    pub threshold: f32,
    /// Whether to attach the source file name to each result.
    pub include_metadata: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            threshold: 0.7,
            include_metadata: true,
        }
    }
}

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Returns 0.0 when either vector has zero magnitude. Errors when the vectors
/// have different lengths; a model mismatch must never be silently tolerated.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SearchError> {
    if a.len() != b.len() {
        return Err(SearchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Ranks stored chunks against a query embedding.
pub struct SimilaritySearchService;

impl SimilaritySearchService {
    /// Construct a new search service instance.
    pub const fn new() -> Self {
        Self
    }

    /// Embed the query and rank every stored chunk against it.
    ///
    /// Chunks with an empty embedding vector are skipped; results below the
    /// threshold are dropped; the remainder is stable-sorted by score
    /// descending, truncated to `top_k`, and assigned 1-based ranks.
    pub async fn search_similar_chunks(
        &self,
        query: &str,
        documents: &[DocumentEmbedding],
        client: &dyn EmbeddingClient,
        embedding_service: &EmbeddingService,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let query_vector = embedding_service.get_embedding(query, client).await?;

        let mut results: Vec<SearchResult> = Vec::new();
        for document in documents {
            for chunk in &document.chunks {
                if chunk.embedding.is_empty() {
                    continue;
                }
                let score = cosine_similarity(&query_vector, &chunk.embedding)?;
                if score >= options.threshold {
                    results.push(SearchResult {
                        chunk: chunk.clone(),
                        score,
                        document_id: document.document_id.clone(),
                        file_name: options
                            .include_metadata
                            .then(|| document.metadata.file_name.clone()),
                        rank: 0,
                    });
                }
            }
        }

        // sort_by is stable, so ties keep document/chunk iteration order.
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(options.top_k);
        for (position, result) in results.iter_mut().enumerate() {
            result.rank = position + 1;
        }

        tracing::debug!(
            query_len = query.chars().count(),
            documents = documents.len(),
            hits = results.len(),
            threshold = options.threshold,
            top_k = options.top_k,
            "Similarity search completed"
        );
        Ok(results)
    }
}

impl Default for SimilaritySearchService {
    fn default() -> Self {
        Self::new()
    }
}
