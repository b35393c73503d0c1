//! Embedding service, remote client abstraction, and batching policy.

mod http;

pub use http::HttpEmbeddingClient;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::sync::RwLock;
use thiserror::Error;

/// Errors raised while generating embeddings.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid embedding endpoint URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before a usable response arrived, including a
    /// malformed JSON body.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint responded with an unexpected status code.
    #[error("Unexpected embedding endpoint response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the endpoint.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// The endpoint returned a different number of vectors than texts sent.
    #[error("Embedding endpoint returned {returned} vectors for {requested} texts")]
    CountMismatch {
        /// Number of texts in the request.
        requested: usize,
        /// Number of vectors in the response.
        returned: usize,
    },
    /// The endpoint returned no vectors for a single-text request.
    #[error("Embedding endpoint returned no vectors for the query")]
    EmptyResponse,
}

/// Interface implemented by remote embedding backends.
///
/// Request contract: one vector per input text, same order. Transport
/// failures and malformed payloads are surfaced unchanged; no retry happens
/// at this layer.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Mutable embedding configuration held by the service.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Optional bearer token forwarded to the HTTP client at construction.
    pub api_key: Option<String>,
    /// Embedding model identifier.
    pub model: String,
    /// Input token budget advertised for the model.
    pub max_tokens: usize,
    /// Number of texts sent per remote request.
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "text-embedding-3-small".to_string(),
            max_tokens: 8191,
            batch_size: 10,
        }
    }
}

/// Static view of the service configuration exposed for diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingStats {
    /// Configured embedding model identifier.
    pub model: String,
    /// Vector dimensionality derived from the model identifier.
    pub dimensions: usize,
    /// Input token budget advertised for the model.
    pub max_tokens: usize,
    /// Number of texts sent per embedding request.
    pub batch_size: usize,
}

/// Progress observer invoked after each completed batch with
/// `(completed, total)` chunk counts.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(usize, usize) + Send);

/// Batches chunk texts to a remote embedding endpoint.
///
/// Batches are processed strictly sequentially: the next request is not
/// issued until the previous response has been accumulated. This bounds
/// outstanding requests to one and keeps progress reporting monotonic. Any
/// batch failure aborts the whole operation with no partial result.
pub struct EmbeddingService {
    config: RwLock<EmbeddingConfig>,
}

impl EmbeddingService {
    /// Build a service around the supplied configuration.
    pub fn new(config: EmbeddingConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the service configuration.
    ///
    /// Only safe between operations: reconfiguring while a batch call is in
    /// flight leaves it undefined which batches observe the old values.
    pub fn set_config(&self, config: EmbeddingConfig) {
        let mut guard = self.config.write().expect("embedding config lock poisoned");
        *guard = config;
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> EmbeddingConfig {
        self.config
            .read()
            .expect("embedding config lock poisoned")
            .clone()
    }

    /// Model, dimensionality, and token budget for the current configuration.
    ///
    /// Dimensionality is a static mapping from known model identifiers, not
    /// introspected from the API.
    pub fn stats(&self) -> EmbeddingStats {
        let config = self.config();
        EmbeddingStats {
            dimensions: model_dimensions(&config.model),
            model: config.model,
            max_tokens: config.max_tokens,
            batch_size: config.batch_size,
        }
    }

    /// Embed a single text, returning the first vector of the response.
    pub async fn get_embedding(
        &self,
        text: &str,
        client: &dyn EmbeddingClient,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [text.to_string()];
        let mut vectors = client.embed_texts(&texts).await?;
        if vectors.is_empty() {
            return Err(EmbeddingError::EmptyResponse);
        }
        Ok(vectors.swap_remove(0))
    }

    /// Embed every chunk text, one vector per chunk in input order.
    ///
    /// `on_progress`, when supplied, is invoked after each batch with the
    /// completed count capped at the total.
    pub async fn generate_batch_embeddings(
        &self,
        texts: &[String],
        client: &dyn EmbeddingClient,
        mut on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let batch_size = self.config().batch_size.max(1);
        let total = texts.len();
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(total);

        for batch in texts.chunks(batch_size) {
            let mut returned = client.embed_texts(batch).await?;
            if returned.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    requested: batch.len(),
                    returned: returned.len(),
                });
            }
            vectors.append(&mut returned);

            if let Some(callback) = on_progress.as_mut() {
                callback(vectors.len().min(total), total);
            }
        }

        tracing::debug!(
            texts = total,
            batch_size,
            "Generated batch embeddings"
        );
        Ok(vectors)
    }
}

/// Vector dimensionality for a known model identifier: 3072 for the large
/// embedding model family, 1536 otherwise.
pub fn model_dimensions(model: &str) -> usize {
    if model.contains("large") { 3072 } else { 1536 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Stub backend that embeds the i-th text of each request as `[i]` offset
    /// by the number of texts already seen, and records batch shapes.
    struct CountingClient {
        seen: Mutex<usize>,
        batches: Mutex<Vec<usize>>,
        fail_after: Option<usize>,
    }

    impl CountingClient {
        fn new() -> Self {
            Self {
                seen: Mutex::new(0),
                batches: Mutex::new(Vec::new()),
                fail_after: None,
            }
        }

        fn failing_after(batches: usize) -> Self {
            Self {
                fail_after: Some(batches),
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for CountingClient {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut batches = self.batches.lock().unwrap();
            if self.fail_after.is_some_and(|limit| batches.len() >= limit) {
                return Err(EmbeddingError::EmptyResponse);
            }
            batches.push(texts.len());

            let mut seen = self.seen.lock().unwrap();
            let vectors = (0..texts.len())
                .map(|i| vec![(*seen + i) as f32])
                .collect();
            *seen += texts.len();
            Ok(vectors)
        }
    }

    fn texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("chunk {i}")).collect()
    }

    #[tokio::test]
    async fn batch_embeddings_preserve_input_order() {
        for batch_size in [1, 3, 10, 50] {
            let service = EmbeddingService::new(EmbeddingConfig {
                batch_size,
                ..EmbeddingConfig::default()
            });
            let client = CountingClient::new();
            let vectors = service
                .generate_batch_embeddings(&texts(23), &client, None)
                .await
                .expect("embeddings");

            assert_eq!(vectors.len(), 23);
            for (i, vector) in vectors.iter().enumerate() {
                assert_eq!(vector, &vec![i as f32], "order broken at {i}");
            }
        }
    }

    #[tokio::test]
    async fn batches_are_partitioned_by_batch_size() {
        let service = EmbeddingService::new(EmbeddingConfig {
            batch_size: 10,
            ..EmbeddingConfig::default()
        });
        let client = CountingClient::new();
        service
            .generate_batch_embeddings(&texts(25), &client, None)
            .await
            .expect("embeddings");

        assert_eq!(*client.batches.lock().unwrap(), vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_ends_at_total() {
        let service = EmbeddingService::new(EmbeddingConfig {
            batch_size: 4,
            ..EmbeddingConfig::default()
        });
        let client = CountingClient::new();
        let mut reports: Vec<(usize, usize)> = Vec::new();
        let mut observer = |completed: usize, total: usize| reports.push((completed, total));

        service
            .generate_batch_embeddings(&texts(10), &client, Some(&mut observer))
            .await
            .expect("embeddings");

        assert_eq!(reports, vec![(4, 10), (8, 10), (10, 10)]);
        assert!(reports.windows(2).all(|pair| pair[0].0 <= pair[1].0));
    }

    #[tokio::test]
    async fn batch_failure_aborts_without_partial_result() {
        let service = EmbeddingService::new(EmbeddingConfig {
            batch_size: 5,
            ..EmbeddingConfig::default()
        });
        let client = CountingClient::failing_after(1);
        let error = service
            .generate_batch_embeddings(&texts(12), &client, None)
            .await
            .unwrap_err();

        assert!(matches!(error, EmbeddingError::EmptyResponse));
        // Exactly one batch went out before the abort.
        assert_eq!(client.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_input_issues_no_requests() {
        let service = EmbeddingService::new(EmbeddingConfig::default());
        let client = CountingClient::new();
        let vectors = service
            .generate_batch_embeddings(&[], &client, None)
            .await
            .expect("embeddings");

        assert!(vectors.is_empty());
        assert!(client.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn get_embedding_returns_first_vector() {
        let service = EmbeddingService::new(EmbeddingConfig::default());
        let client = CountingClient::new();
        let vector = service
            .get_embedding("query", &client)
            .await
            .expect("vector");
        assert_eq!(vector, vec![0.0]);
    }

    #[test]
    fn stats_derive_dimensions_from_model_name() {
        let service = EmbeddingService::new(EmbeddingConfig {
            model: "text-embedding-3-large".into(),
            ..EmbeddingConfig::default()
        });
        assert_eq!(service.stats().dimensions, 3072);

        service.set_config(EmbeddingConfig::default());
        let stats = service.stats();
        assert_eq!(stats.dimensions, 1536);
        assert_eq!(stats.model, "text-embedding-3-small");
        assert_eq!(stats.max_tokens, 8191);
        assert_eq!(stats.batch_size, 10);
    }
}
