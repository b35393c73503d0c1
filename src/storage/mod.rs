//! Blob storage collaborator and document record persistence.
//!
//! The pipeline persists through the [`BlobStore`] trait: arbitrary blobs at
//! caller-chosen paths with prefix listing and recursive deletion. The
//! [`DocumentStore`] glue layers the document layout on top: per document id,
//! the embeddings JSON, the extracted text, and a small metadata record.

mod documents;
mod local;

pub use documents::{DocumentRecord, DocumentStatus, DocumentStore};
pub use local::LocalBlobStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned while interacting with blob storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested blob does not exist.
    #[error("Blob not found: {0}")]
    NotFound(String),
    /// Blob path escapes the store root or is otherwise malformed.
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),
    /// Underlying I/O operation failed.
    #[error("I/O failure at '{path}': {source}")]
    Io {
        /// Blob path involved in the failing operation.
        path: String,
        /// Underlying error raised by the filesystem.
        #[source]
        source: std::io::Error,
    },
    /// A persisted record could not be serialized or parsed.
    #[error("Failed to (de)serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Interface implemented by blob storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob at the given path, replacing any existing blob.
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), StorageError>;

    /// Retrieve a blob by path.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Enumerate blob paths under a prefix, sorted lexicographically.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete a single blob. Deleting a missing blob is a no-op.
    async fn delete(&self, path: &str) -> Result<(), StorageError>;

    /// Recursively delete every blob under a prefix. A missing prefix is a
    /// no-op.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), StorageError>;
}
