//! HTTP surface for the document pipeline.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /documents` – Upload a document: extract, clean, chunk, embed, and
//!   persist it. Returns the assigned id and chunk counters.
//! - `GET /documents` – List metadata records for every stored document.
//! - `DELETE /documents/{id}` – Remove a document and everything stored under it.
//! - `POST /search` – Rank stored chunks against a natural-language query.
//! - `GET /stats` – Current embedding model configuration and dimensions.
//! - `GET /metrics` – Observe pipeline counters and the last chunk count.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::extract::{ExtractError, SourceFile};
use crate::ingest::{IngestApi, IngestError};
use crate::processing::{ProcessingError, SearchResult};
use crate::storage::{DocumentRecord, StorageError};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the ingestion and search API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: IngestApi + 'static,
{
    Router::new()
        .route(
            "/documents",
            get(list_documents::<S>).post(upload_document::<S>),
        )
        .route("/documents/:id", delete(delete_document::<S>))
        .route("/search", post(search_documents::<S>))
        .route("/stats", get(get_stats::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /documents` endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest {
    /// Original file name, used for metadata and error messages.
    file_name: String,
    /// Declared MIME type of the upload.
    mime_type: String,
    /// Document contents as UTF-8 text.
    content: String,
    /// Optional id override; defaults to a content-derived key.
    #[serde(default)]
    document_id: Option<String>,
}

/// Success response for the `POST /documents` endpoint.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    document_id: String,
    total_chunks: usize,
    status: crate::storage::DocumentStatus,
}

/// Upload a document and run it through the full pipeline.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: IngestApi,
{
    let file = SourceFile {
        file_name: request.file_name,
        mime_type: request.mime_type,
        bytes: request.content.into_bytes(),
    };
    let outcome = service.ingest_document(file, request.document_id).await?;
    tracing::info!(
        document_id = outcome.document_id,
        chunks = outcome.total_chunks,
        "Upload request completed"
    );
    Ok(Json(UploadResponse {
        document_id: outcome.document_id,
        total_chunks: outcome.total_chunks,
        status: outcome.record.status,
    }))
}

/// Response body for `GET /documents`.
#[derive(Serialize)]
struct DocumentsResponse {
    documents: Vec<DocumentRecord>,
}

/// List metadata records for every stored document.
async fn list_documents<S>(
    State(service): State<Arc<S>>,
) -> Result<Json<DocumentsResponse>, AppError>
where
    S: IngestApi,
{
    let documents = service.list_documents().await?;
    Ok(Json(DocumentsResponse { documents }))
}

/// Delete a document by id.
async fn delete_document<S>(
    State(service): State<Arc<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError>
where
    S: IngestApi,
{
    service.delete_document(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Request body for the `POST /search` endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    /// Natural-language query text.
    query: String,
    /// Optional maximum number of results (defaults to the server setting).
    #[serde(default)]
    top_k: Option<usize>,
    /// Optional minimum similarity score (defaults to the server setting).
    #[serde(default)]
    score_threshold: Option<f32>,
    /// Whether to include file names with each result.
    #[serde(default = "default_include_metadata")]
    include_metadata: bool,
}

fn default_include_metadata() -> bool {
    true
}

/// Response body for the `POST /search` endpoint.
#[derive(Serialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

/// Rank stored chunks against a query.
async fn search_documents<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError>
where
    S: IngestApi,
{
    let results = service
        .search(
            &request.query,
            request.top_k,
            request.score_threshold,
            request.include_metadata,
        )
        .await?;
    tracing::debug!(results = results.len(), "Search request completed");
    Ok(Json(SearchResponse { results }))
}

/// Return the current embedding model statistics.
async fn get_stats<S>(State(service): State<Arc<S>>) -> Json<crate::embedding::EmbeddingStats>
where
    S: IngestApi,
{
    Json(service.embedding_stats())
}

/// Return a concise metrics snapshot with pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: IngestApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/documents",
                description: "Extract, clean, chunk, embed, and persist a document. Response returns { \"documentId\": string, \"totalChunks\": number }.",
                request_example: Some(json!({
                    "fileName": "notes.txt",
                    "mimeType": "text/plain",
                    "content": "Document contents"
                })),
            },
            CommandDescriptor {
                name: "list_documents",
                method: "GET",
                path: "/documents",
                description: "Return the metadata record of every stored document.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_document",
                method: "DELETE",
                path: "/documents/{id}",
                description: "Remove a document and everything persisted under its id.",
                request_example: None,
            },
            CommandDescriptor {
                name: "search",
                method: "POST",
                path: "/search",
                description: "Rank stored chunks against a query by cosine similarity.",
                request_example: Some(json!({
                    "query": "what does the contract say about renewal",
                    "topK": 5,
                    "scoreThreshold": 0.7,
                    "includeMetadata": true
                })),
            },
            CommandDescriptor {
                name: "stats",
                method: "GET",
                path: "/stats",
                description: "Return the active embedding model, its dimensions, and batching limits.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(IngestError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            IngestError::Intake(ExtractError::UnsupportedType { .. })
            | IngestError::Intake(ExtractError::TooLarge { .. })
            | IngestError::Intake(ExtractError::InvalidEncoding { .. }) => {
                StatusCode::BAD_REQUEST
            }
            IngestError::Processing(ProcessingError::EmptyDocument { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IngestError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::embedding::EmbeddingStats;
    use crate::extract::SourceFile;
    use crate::ingest::{IngestApi, IngestError, IngestOutcome};
    use crate::metrics::MetricsSnapshot;
    use crate::processing::{ProcessingError, SearchResult};
    use crate::storage::{DocumentRecord, DocumentStatus, StorageError};
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[tokio::test]
    async fn commands_catalog_exposes_upload_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload")
            .expect("upload command present");

        assert_eq!(upload.method, "POST");
        assert_eq!(upload.path, "/documents");
        assert!(upload.description.to_lowercase().contains("chunk"));

        // ensure catalog exposes multiple commands for host discovery
        assert!(commands.len() >= 5);
    }

    #[tokio::test]
    async fn upload_route_forwards_the_payload() {
        let service = Arc::new(StubService::default());
        let app = create_router(service.clone());

        let payload = json!({
            "fileName": "notes.txt",
            "mimeType": "text/plain",
            "content": "Document body"
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["documentId"], "doc-stub");
        assert_eq!(json["totalChunks"], 2);
        assert_eq!(json["status"], "ready");

        let uploads = service.uploads.lock().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].file_name, "notes.txt");
        assert_eq!(uploads[0].bytes, b"Document body");
    }

    #[tokio::test]
    async fn empty_document_maps_to_unprocessable_entity() {
        let service = Arc::new(StubService {
            fail_empty: true,
            ..StubService::default()
        });
        let app = create_router(service);

        let payload = json!({
            "fileName": "blank.txt",
            "mimeType": "text/plain",
            "content": "   "
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/documents")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn delete_unknown_document_maps_to_not_found() {
        let service = Arc::new(StubService::default());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/documents/doc-missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_route_forwards_options() {
        let service = Arc::new(StubService::default());
        let app = create_router(service.clone());

        let payload = json!({
            "query": "renewal terms",
            "topK": 3,
            "scoreThreshold": 0.5,
            "includeMetadata": false
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let searches = service.searches.lock().await;
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0], ("renewal terms".to_string(), Some(3), Some(0.5), false));
    }

    #[tokio::test]
    async fn metrics_route_serializes_camel_case_counters() {
        let service = Arc::new(StubService::default());
        let app = create_router(service);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(json["documentsProcessed"], 4);
        assert_eq!(json["chunksEmbedded"], 9);
    }

    #[derive(Default)]
    struct StubService {
        uploads: Mutex<Vec<SourceFile>>,
        searches: Mutex<Vec<(String, Option<usize>, Option<f32>, bool)>>,
        fail_empty: bool,
    }

    #[async_trait]
    impl IngestApi for StubService {
        async fn ingest_document(
            &self,
            file: SourceFile,
            _document_id: Option<String>,
        ) -> Result<IngestOutcome, IngestError> {
            if self.fail_empty {
                return Err(IngestError::Processing(ProcessingError::EmptyDocument {
                    file_name: file.file_name,
                }));
            }
            let record = DocumentRecord {
                original_file_name: file.file_name.clone(),
                document_id: "doc-stub".into(),
                file_size: file.bytes.len(),
                mime_type: file.mime_type.clone(),
                uploaded_at: "2026-01-01T00:00:00Z".into(),
                status: DocumentStatus::Ready,
                has_embeddings: true,
            };
            self.uploads.lock().await.push(file);
            Ok(IngestOutcome {
                document_id: "doc-stub".into(),
                total_chunks: 2,
                record,
            })
        }

        async fn search(
            &self,
            query: &str,
            top_k: Option<usize>,
            score_threshold: Option<f32>,
            include_metadata: bool,
        ) -> Result<Vec<SearchResult>, IngestError> {
            self.searches.lock().await.push((
                query.to_string(),
                top_k,
                score_threshold,
                include_metadata,
            ));
            Ok(Vec::new())
        }

        async fn list_documents(&self) -> Result<Vec<DocumentRecord>, IngestError> {
            Ok(Vec::new())
        }

        async fn delete_document(&self, document_id: &str) -> Result<(), IngestError> {
            Err(IngestError::Storage(StorageError::NotFound(
                document_id.to_string(),
            )))
        }

        fn embedding_stats(&self) -> EmbeddingStats {
            EmbeddingStats {
                model: "text-embedding-3-small".into(),
                dimensions: 1536,
                max_tokens: 8191,
                batch_size: 10,
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                documents_processed: 4,
                chunks_embedded: 9,
                searches_run: 2,
                last_chunk_count: Some(3),
            }
        }
    }
}
