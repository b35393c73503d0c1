//! Document-level persistence layout over a blob store.

use super::{BlobStore, StorageError};
use crate::processing::DocumentEmbedding;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// Upload accepted, processing in progress.
    Processing,
    /// Processing completed and embeddings were persisted.
    Ready,
    /// Processing failed; the record remains listed for diagnostics.
    Error,
}

/// Lightweight metadata record persisted per document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Original file name supplied by the uploader.
    pub original_file_name: String,
    /// Stable document identifier.
    pub document_id: String,
    /// Upload size in bytes.
    pub file_size: usize,
    /// Declared MIME type of the upload.
    pub mime_type: String,
    /// RFC3339 timestamp of when the upload was accepted.
    pub uploaded_at: String,
    /// Current lifecycle state.
    pub status: DocumentStatus,
    /// Whether an embeddings blob exists for the document.
    pub has_embeddings: bool,
}

/// Persists documents through a [`BlobStore`] using a fixed per-id layout:
/// `documents/{id}/embeddings.json`, `documents/{id}/content.txt`, and
/// `documents/{id}/record.json`.
///
/// Every write is a whole-file upsert keyed by document id, so re-ingesting
/// the same id replaces the document wholesale. Concurrent writes to one id
/// are last-write-wins.
pub struct DocumentStore {
    blobs: Box<dyn BlobStore>,
}

impl DocumentStore {
    /// Build a store over the supplied blob backend.
    pub fn new(blobs: Box<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Persist a fully processed document: record, extracted text, and
    /// embeddings, in that order.
    pub async fn save_document(
        &self,
        embedding: &DocumentEmbedding,
        extracted_text: &str,
        record: &DocumentRecord,
    ) -> Result<(), StorageError> {
        let id = &embedding.document_id;
        self.save_record(record).await?;
        self.blobs
            .put(&content_path(id), extracted_text.as_bytes().to_vec())
            .await?;
        let payload = serde_json::to_vec(embedding)?;
        self.blobs.put(&embeddings_path(id), payload).await?;
        tracing::debug!(document_id = %id, chunks = embedding.chunks.len(), "Document persisted");
        Ok(())
    }

    /// Persist only the metadata record, e.g. to mark a failed ingestion.
    pub async fn save_record(&self, record: &DocumentRecord) -> Result<(), StorageError> {
        let payload = serde_json::to_vec(record)?;
        self.blobs
            .put(&record_path(&record.document_id), payload)
            .await
    }

    /// Load the metadata record for one document.
    pub async fn load_record(&self, document_id: &str) -> Result<DocumentRecord, StorageError> {
        let bytes = self.blobs.get(&record_path(document_id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Load the embeddings for one document.
    pub async fn load_embeddings(
        &self,
        document_id: &str,
    ) -> Result<DocumentEmbedding, StorageError> {
        let bytes = self.blobs.get(&embeddings_path(document_id)).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Enumerate all persisted document records, sorted by document id.
    pub async fn list_records(&self) -> Result<Vec<DocumentRecord>, StorageError> {
        let keys = self.blobs.list("documents").await?;
        let mut records = Vec::new();
        for key in keys {
            if !key.ends_with("/record.json") {
                continue;
            }
            let bytes = self.blobs.get(&key).await?;
            match serde_json::from_slice::<DocumentRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(error) => {
                    tracing::warn!(key, error = %error, "Skipping unreadable document record");
                }
            }
        }
        records.sort_by(|a, b| a.document_id.cmp(&b.document_id));
        Ok(records)
    }

    /// Load embeddings for every document marked as having them.
    pub async fn load_all_embeddings(&self) -> Result<Vec<DocumentEmbedding>, StorageError> {
        let records = self.list_records().await?;
        let mut documents = Vec::new();
        for record in records {
            if record.status != DocumentStatus::Ready || !record.has_embeddings {
                continue;
            }
            documents.push(self.load_embeddings(&record.document_id).await?);
        }
        Ok(documents)
    }

    /// Delete a document and everything stored under its id.
    ///
    /// Errors with [`StorageError::NotFound`] when no record exists.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), StorageError> {
        self.load_record(document_id).await.map_err(|error| {
            if matches!(error, StorageError::NotFound(_)) {
                StorageError::NotFound(document_id.to_string())
            } else {
                error
            }
        })?;
        self.blobs
            .delete_prefix(&format!("documents/{document_id}"))
            .await?;
        tracing::info!(document_id, "Document deleted");
        Ok(())
    }
}

fn record_path(document_id: &str) -> String {
    format!("documents/{document_id}/record.json")
}

fn content_path(document_id: &str) -> String {
    format!("documents/{document_id}/content.txt")
}

fn embeddings_path(document_id: &str) -> String {
    format!("documents/{document_id}/embeddings.json")
}
