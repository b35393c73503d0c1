use docpipe::{api, config::Config, logging};
use docpipe::embedding::{EmbeddingConfig, EmbeddingService, HttpEmbeddingClient};
use docpipe::extract::TextExtractor;
use docpipe::ingest::IngestService;
use docpipe::processing::{ChunkPolicy, DocumentProcessor};
use docpipe::storage::{DocumentStore, LocalBlobStore};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(error = %error, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let service = match build_service(&config) {
        Ok(service) => Arc::new(service),
        Err(error) => {
            tracing::error!(error = %error, "Failed to initialize pipeline");
            std::process::exit(1);
        }
    };
    let app = api::create_router(service);

    let (listener, port) = bind_listener(&config)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

fn build_service(config: &Config) -> Result<IngestService, docpipe::embedding::EmbeddingError> {
    let defaults = EmbeddingConfig::default();
    let embedding_config = EmbeddingConfig {
        api_key: config.embedding_api_key.clone(),
        model: config.embedding_model.clone(),
        max_tokens: config.embedding_max_tokens.unwrap_or(defaults.max_tokens),
        batch_size: config.embedding_batch_size.unwrap_or(defaults.batch_size),
    };
    let client = HttpEmbeddingClient::new(
        &config.embedding_api_url,
        config.embedding_api_key.clone(),
    )?;

    let policy_defaults = ChunkPolicy::default();
    let chunk_policy = ChunkPolicy {
        target_size: config.chunk_target_size.unwrap_or(policy_defaults.target_size),
        overlap: config.chunk_overlap.unwrap_or(policy_defaults.overlap),
        ..policy_defaults
    };

    let processor = DocumentProcessor::new(
        Box::new(TextExtractor::new()),
        EmbeddingService::new(embedding_config),
        chunk_policy,
    );
    let store = DocumentStore::new(Box::new(LocalBlobStore::new(&config.storage_root)));

    Ok(IngestService::new(
        processor,
        store,
        Box::new(client),
        config,
    ))
}

async fn bind_listener(config: &Config) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = config.server_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4200..=4299;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4200-4299",
    ))
}
