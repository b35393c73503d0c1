#![deny(missing_docs)]

//! Core library for the docpipe document ingestion and retrieval service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding service, remote client abstraction, and HTTP adapter.
pub mod embedding;
/// Content extraction collaborator and upload intake constraints.
pub mod extract;
/// Upload flow glue: validation, processing, and persistence.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and search metrics helpers.
pub mod metrics;
/// Document processing pipeline: cleaning, chunking, and orchestration.
pub mod processing;
/// Cosine similarity search over stored document embeddings.
pub mod search;
/// Blob storage collaborator and document record persistence.
pub mod storage;
