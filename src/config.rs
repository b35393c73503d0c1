use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the docpipe server.
///
/// Loaded once near process start and passed explicitly into the services
/// that need it; there is no global configuration singleton.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the remote embedding endpoint.
    pub embedding_api_url: String,
    /// Optional bearer token sent with embedding requests.
    pub embedding_api_key: Option<String>,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Optional override for the number of texts sent per embedding request.
    pub embedding_batch_size: Option<usize>,
    /// Optional override for the model's input token budget.
    pub embedding_max_tokens: Option<usize>,
    /// Optional override for the nominal chunk size target (characters).
    pub chunk_target_size: Option<usize>,
    /// Optional override for the chunk overlap budget (characters).
    pub chunk_overlap: Option<usize>,
    /// Default number of results returned by a search.
    pub search_default_top_k: usize,
    /// Default minimum similarity score accepted by a search.
    pub search_default_score_threshold: f32,
    /// Root directory for locally persisted blobs.
    pub storage_root: String,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            embedding_api_url: load_env("EMBEDDING_API_URL")?,
            embedding_api_key: load_env_optional("EMBEDDING_API_KEY"),
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_batch_size: parse_optional("EMBEDDING_BATCH_SIZE")?,
            embedding_max_tokens: parse_optional("EMBEDDING_MAX_TOKENS")?,
            chunk_target_size: parse_optional("CHUNK_TARGET_SIZE")?,
            chunk_overlap: parse_optional("CHUNK_OVERLAP")?,
            search_default_top_k: parse_optional("SEARCH_DEFAULT_TOP_K")?.unwrap_or(5),
            search_default_score_threshold: parse_optional("SEARCH_DEFAULT_SCORE_THRESHOLD")?
                .unwrap_or(0.7),
            storage_root: load_env_optional("STORAGE_ROOT").unwrap_or_else(|| "data".to_string()),
            server_port: parse_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}
