pub mod chunker;
pub mod cohere;
pub mod hashing;
pub mod openai;

pub use chunker::{split, ChunkConfig, Chunks, TextChunk, TextChunker};
pub use cohere::{CohereClient, CohereConfig, InputType};
pub use hashing::HashingEmbeddingProvider;
pub use openai::{OpenAiEmbeddingClient, OpenAiEmbeddingConfig};

use akasha_core::config::EmbeddingConfig;
use akasha_core::{Error, Result, RetryPolicy};
use std::future::Future;
use std::pin::Pin;

pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;
pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<f32>>> + Send + 'a>>;

/// Maps text to fixed-dimension vectors: one vector per input, same order.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_>;

    /// Embeds a search query. Providers that distinguish queries from
    /// documents override this.
    fn embed_query(&self, text: String) -> QueryFuture<'_> {
        Box::pin(async move {
            let mut embeddings = self.embed(vec![text]).await?;
            match (embeddings.pop(), embeddings.is_empty()) {
                (Some(embedding), true) => Ok(embedding),
                _ => Err(Error::malformed(
                    "embedding provider did not return exactly one query vector",
                )),
            }
        })
    }

    fn dimension(&self) -> usize;
}

impl EmbeddingProvider for OpenAiEmbeddingClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.dimensions()
    }
}

impl EmbeddingProvider for CohereClient {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn embed_query(&self, text: String) -> QueryFuture<'_> {
        Box::pin(async move {
            self.embed_as(vec![text], InputType::SearchQuery)
                .await?
                .pop()
                .ok_or_else(|| Error::malformed("Cohere returned no query embedding"))
        })
    }
    fn dimension(&self) -> usize {
        self.dimensions()
    }
}

impl EmbeddingProvider for HashingEmbeddingProvider {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(self.embed(texts))
    }
    fn dimension(&self) -> usize {
        self.embedding_dimension()
    }
}

pub fn create_embedding_provider(cfg: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let retry = RetryPolicy::new(cfg.max_retries, 1000);
    match cfg.provider.as_str() {
        "openai" => {
            let defaults = OpenAiEmbeddingConfig::default();
            let openai_cfg = OpenAiEmbeddingConfig {
                api_key: cfg.api_key.clone().unwrap_or_default(),
                model: cfg.model.clone().unwrap_or(defaults.model),
                base_url: cfg.base_url.clone().unwrap_or(defaults.base_url),
                dimensions: cfg.dimensions.unwrap_or(defaults.dimensions),
                timeout_secs: cfg.timeout_secs,
                retry,
            };
            Ok(Box::new(OpenAiEmbeddingClient::new(openai_cfg)?))
        }
        "cohere" => {
            let defaults = CohereConfig::default();
            let model = cfg.model.clone().unwrap_or(defaults.model);
            let cohere_cfg = CohereConfig {
                api_key: cfg.api_key.clone().unwrap_or_default(),
                dimensions: cfg
                    .dimensions
                    .unwrap_or_else(|| cohere::model_dimensions(&model)),
                model,
                base_url: cfg.base_url.clone().unwrap_or(defaults.base_url),
                timeout_secs: cfg.timeout_secs,
                retry,
            };
            Ok(Box::new(CohereClient::new(cohere_cfg)?))
        }
        "hashing" => Ok(Box::new(match cfg.dimensions {
            Some(dim) => HashingEmbeddingProvider::new(dim),
            None => HashingEmbeddingProvider::with_standard_dimension(),
        })),
        other => Err(Error::configuration(format!(
            "Unknown embedding provider '{}', expected one of: openai, cohere, hashing",
            other
        ))),
    }
}
