//! Content extraction collaborator and upload intake constraints.
//!
//! The pipeline treats extraction as an opaque `file -> text` operation behind the
//! [`ContentExtractor`] trait. The bundled [`TextExtractor`] covers the text-like
//! formats (plain text, Markdown, CSV, JSON); binary formats surface an explicit
//! unsupported-format error so the caller can route them to a dedicated converter.

use async_trait::async_trait;
use thiserror::Error;

/// Maximum accepted upload size in bytes (10 MiB). Larger files are rejected
/// before any processing begins.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// MIME types accepted by the upload flow.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/markdown",
    "text/csv",
    "application/json",
];

/// An uploaded file handed to the pipeline: a name, a MIME type, and raw bytes.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name supplied by the uploader.
    pub file_name: String,
    /// Declared MIME type of the file contents.
    pub mime_type: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Errors raised while validating or extracting an uploaded file.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The declared MIME type is outside the supported set.
    #[error("Unsupported file type: {mime_type}")]
    UnsupportedType {
        /// MIME type declared by the upload.
        mime_type: String,
    },
    /// The file exceeds the upload size cap.
    #[error("File '{file_name}' exceeds the {limit}-byte limit ({size} bytes)")]
    TooLarge {
        /// Name of the rejected file.
        file_name: String,
        /// Actual size of the upload in bytes.
        size: usize,
        /// Maximum accepted size in bytes.
        limit: usize,
    },
    /// The file contents could not be decoded as UTF-8 text.
    #[error("File '{file_name}' is not valid UTF-8 text")]
    InvalidEncoding {
        /// Name of the undecodable file.
        file_name: String,
    },
}

/// Reject uploads that violate the intake constraints before any processing.
pub fn validate_source(file: &SourceFile) -> Result<(), ExtractError> {
    if file.bytes.len() > MAX_FILE_SIZE {
        return Err(ExtractError::TooLarge {
            file_name: file.file_name.clone(),
            size: file.bytes.len(),
            limit: MAX_FILE_SIZE,
        });
    }
    if !SUPPORTED_MIME_TYPES.contains(&file.mime_type.as_str()) {
        return Err(ExtractError::UnsupportedType {
            mime_type: file.mime_type.clone(),
        });
    }
    Ok(())
}

/// Interface implemented by content extraction backends.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Convert the uploaded file into plain text.
    async fn extract(&self, file: &SourceFile) -> Result<String, ExtractError>;
}

/// Extractor for text-like formats that are already UTF-8 on the wire.
pub struct TextExtractor;

impl TextExtractor {
    /// Construct a new text extractor instance.
    pub const fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    async fn extract(&self, file: &SourceFile) -> Result<String, ExtractError> {
        match file.mime_type.as_str() {
            "text/plain" | "text/markdown" | "text/csv" | "application/json" => {
                String::from_utf8(file.bytes.clone()).map_err(|_| ExtractError::InvalidEncoding {
                    file_name: file.file_name.clone(),
                })
            }
            // PDF and Word conversion is delegated to a dedicated collaborator.
            other => Err(ExtractError::UnsupportedType {
                mime_type: other.to_string(),
            }),
        }
    }
}
