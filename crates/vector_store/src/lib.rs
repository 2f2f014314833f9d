pub mod memory;
pub mod models;
pub mod pgvector;
pub mod session_store;
pub mod stats;
pub mod store;

pub use memory::InMemoryVectorStore;
pub use models::{ChunkMetadata, ChunkRecord, Document, DocumentSummary, SearchResult, UsageRecord};
pub use pgvector::PgVectorStore;
pub use session_store::RedisHistoryStore;
pub use stats::{InMemoryStatsRecorder, PgStatsRecorder, StatsRecorder};
pub use store::VectorStore;

use akasha_core::config::VectorStoreConfig;
use akasha_core::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Vector store and usage recorder sharing one backend.
#[derive(Clone)]
pub struct Storage {
    pub vectors: Arc<dyn VectorStore>,
    pub stats: Arc<dyn StatsRecorder>,
}

impl Storage {
    pub fn in_memory(dimensions: usize) -> Self {
        Self {
            vectors: Arc::new(InMemoryVectorStore::new(dimensions)),
            stats: Arc::new(InMemoryStatsRecorder::new()),
        }
    }
}

/// Picks the backend from the URL scheme: `memory://` or
/// `postgres://`/`postgresql://`.
pub async fn connect(cfg: &VectorStoreConfig) -> Result<Storage> {
    let scheme = cfg.url.split("://").next().unwrap_or_default();
    match scheme {
        "memory" => {
            info!("Using in-memory vector store");
            Ok(Storage::in_memory(cfg.dimensions))
        }
        "postgres" | "postgresql" => {
            let store = PgVectorStore::connect(&cfg.url, cfg.dimensions).await?;
            Ok(Storage {
                stats: Arc::new(store.stats_recorder()),
                vectors: Arc::new(store),
            })
        }
        _ => Err(Error::configuration(format!(
            "Unsupported vector store URL '{}', expected memory:// or postgres://",
            cfg.url
        ))),
    }
}
