use akasha_core::config::Config;
use akasha_core::{Error, HistoryStore, InMemoryHistoryStore, Result};
use embeddings::{create_embedding_provider, EmbeddingProvider};
use llm::{create_completion_provider, CompletionProvider};
use log::info;
use qa::{ChunkSettings, Ingestor, QaSettings, RetrievalQa};
use std::sync::Arc;
use std::time::Duration;
use vector_store::{RedisHistoryStore, StatsRecorder, Storage, VectorStore};

/// The service backends one server instance talks to.
pub struct Components {
    pub completion: Arc<dyn CompletionProvider>,
    /// Models accepted by `completion`, in display order.
    pub models: Vec<String>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub store: Arc<dyn VectorStore>,
    pub stats: Arc<dyn StatsRecorder>,
    pub history: Arc<dyn HistoryStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub qa: Arc<RetrievalQa>,
    pub ingestor: Arc<Ingestor>,
    pub store: Arc<dyn VectorStore>,
    pub history: Arc<dyn HistoryStore>,
    pub models: Arc<Vec<String>>,
    pub qa_defaults: QaSettings,
    pub chunk_defaults: ChunkSettings,
}

impl AppState {
    pub fn new(components: Components, config: &Config) -> Self {
        let Components {
            completion,
            models,
            embedder,
            store,
            stats,
            history,
        } = components;

        let qa = RetrievalQa::new(
            completion,
            embedder.clone(),
            store.clone(),
            history.clone(),
            stats,
        );
        let ingestor = Ingestor::new(
            embedder,
            store.clone(),
            config.embedding.batch_size,
            config.embedding.concurrency,
        );

        Self {
            qa: Arc::new(qa),
            ingestor: Arc::new(ingestor),
            store,
            history,
            models: Arc::new(models),
            qa_defaults: QaSettings::from_config(config),
            chunk_defaults: ChunkSettings::from_config(config),
        }
    }

    /// Connects every backend named by the configuration.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::from(create_embedding_provider(&config.embedding)?);
        if embedder.dimension() != config.vector_store.dimensions {
            return Err(Error::configuration(format!(
                "Embedding provider '{}' produces {}-dimensional vectors but the vector store expects {}",
                config.embedding.provider,
                embedder.dimension(),
                config.vector_store.dimensions
            )));
        }

        let Storage { vectors, stats } = vector_store::connect(&config.vector_store).await?;

        let router = create_completion_provider(&config.llm).await?;
        let models = router.models();
        if models.is_empty() {
            return Err(Error::configuration(
                "No completion model is usable; set OPENAI_API_KEY, ANTHROPIC_API_KEY or llm.aws_region",
            ));
        }
        if !models.contains(&config.llm.default_model) {
            return Err(Error::configuration(format!(
                "Default model '{}' is not usable; available: {}",
                config.llm.default_model,
                models.join(", ")
            )));
        }

        let history: Arc<dyn HistoryStore> = match &config.redis {
            Some(redis) => {
                info!("Keeping chat history in Redis");
                Arc::new(
                    RedisHistoryStore::connect(
                        &redis.url,
                        Duration::from_secs(redis.session_ttl_seconds),
                    )
                    .await?,
                )
            }
            None => Arc::new(InMemoryHistoryStore::new(Duration::from_secs(
                config.server.session_ttl_seconds,
            ))),
        };

        Ok(Self::new(
            Components {
                completion: Arc::new(router),
                models,
                embedder,
                store: vectors,
                stats,
                history,
            },
            config,
        ))
    }
}
