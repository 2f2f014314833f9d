use akasha_core::config::{DataConfig, EmbeddingConfig, LlmConfig, VectorStoreConfig};
use akasha_core::Config;
use anyhow::Context;
use log::{info, warn};
use qa::ChunkSettings;
use server::{create_app, AppState};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting document QA server");

    let config = match Config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("Could not load config ({}), using development defaults", e);
            create_development_config()
        }
    }
    .with_env_overrides();
    config.validate().context("Invalid configuration")?;

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize services")?;

    if let Some(data) = &config.data {
        preload_documents(&state, data, ChunkSettings::from_config(&config)).await;
    }

    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    info!("Server running on http://{}", config.server.bind);
    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

async fn preload_documents(state: &AppState, data: &DataConfig, settings: ChunkSettings) {
    info!("Loading documents from {}", data.document_dir);
    match state
        .ingestor
        .preload_dir(Path::new(&data.document_dir), &settings)
        .await
    {
        Ok(reports) => info!("Preloaded {} documents", reports.len()),
        Err(e) => warn!("Server will continue without pre-loaded documents: {}", e),
    }
}

/// Offline setup: hashing embeddings, in-memory vectors, OpenAI models
/// when `OPENAI_API_KEY` is set.
fn create_development_config() -> Config {
    Config {
        embedding: EmbeddingConfig {
            provider: "hashing".to_string(),
            model: None,
            base_url: None,
            dimensions: Some(256),
            api_key: None,
            batch_size: 16,
            concurrency: 4,
            timeout_secs: 30,
            max_retries: 3,
        },
        llm: LlmConfig {
            default_model: "gpt-3.5-turbo".to_string(),
            models: vec![
                "gpt-3.5-turbo".to_string(),
                "gpt-4".to_string(),
                "gpt-4o-mini".to_string(),
                "claude-3-haiku-20240307".to_string(),
            ],
            openai_base_url: None,
            anthropic_base_url: None,
            aws_region: None,
            openai_api_key: None,
            anthropic_api_key: None,
            temperature: 0.1,
            max_tokens: 1024,
            timeout_secs: 30,
            max_retries: 2,
        },
        vector_store: VectorStoreConfig {
            url: "memory://".to_string(),
            dimensions: 256,
        },
        chunking: Default::default(),
        retrieval: Default::default(),
        server: Default::default(),
        redis: None,
        data: Some(DataConfig {
            document_dir: "./data".to_string(),
        }),
    }
}
