//! HTTP adapter for the remote embedding endpoint.

use super::{EmbeddingClient, EmbeddingError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// JSON-over-HTTP embedding client.
///
/// Posts `{"texts": [...]}` to the configured endpoint and expects
/// `{"embeddings": [[...], ...]}` back, one vector per text in request order.
pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbeddingClient {
    /// Construct a new client for the given endpoint.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .user_agent("docpipe/0.1")
            .build()
            .map_err(EmbeddingError::Http)?;
        let endpoint = normalize_endpoint(endpoint).map_err(EmbeddingError::InvalidUrl)?;
        tracing::debug!(
            endpoint = %endpoint,
            has_api_key = api_key.as_deref().map(|value| !value.is_empty()).unwrap_or(false),
            "Initialized embedding HTTP client"
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut request = self.client.post(&self.endpoint).json(&json!({ "texts": texts }));
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Embedding request failed");
            return Err(error);
        }

        let payload: EmbeddingResponse = response.json().await?;
        Ok(payload.embeddings)
    }
}

fn normalize_endpoint(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}
