use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

pub const CHUNK_SIZE_RANGE: RangeInclusive<usize> = 100..=1000;
/// Exclusive upper bound for `chunk_overlap`.
pub const MAX_CHUNK_OVERLAP: usize = 100;
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 256..=4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub redis: Option<RedisConfig>,
    pub data: Option<DataConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub dimensions: Option<usize>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

impl EmbeddingConfig {
    pub fn with_env_overrides(&self) -> Self {
        let key_var = match self.provider.as_str() {
            "cohere" => "COHERE_API_KEY",
            _ => "OPENAI_API_KEY",
        };
        let api_key = env::var(key_var).ok().or_else(|| self.api_key.clone());
        Self {
            api_key,
            ..self.clone()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub default_model: String,
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    pub openai_base_url: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub aws_region: Option<String>,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_retries")]
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn with_env_overrides(&self) -> Self {
        let default_model =
            env::var("LLM_DEFAULT_MODEL").unwrap_or_else(|_| self.default_model.clone());
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .or_else(|| self.openai_api_key.clone());
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .or_else(|| self.anthropic_api_key.clone());
        Self {
            default_model,
            openai_api_key,
            anthropic_api_key,
            ..self.clone()
        }
    }

    /// Models that can actually be served with the configured credentials.
    /// Claude models need an Anthropic key, Bedrock ids need an AWS region.
    pub fn available_models(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|model| {
                if model.starts_with("claude-") {
                    self.anthropic_api_key.as_deref().is_some_and(|k| !k.is_empty())
                } else if model.starts_with("anthropic.") {
                    self.aws_region.is_some()
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    pub url: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl VectorStoreConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("VECTOR_STORE_URL").unwrap_or_else(|_| self.url.clone());
        Self {
            url,
            dimensions: self.dimensions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub k: usize,
    pub threshold: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 3,
            threshold: 0.5,
            timeout_secs: 30,
            max_retries: 2,
            retry_base_delay_ms: 500,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub session_ttl_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_string(),
            session_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub session_ttl_seconds: u64,
}

impl RedisConfig {
    pub fn with_env_overrides(&self) -> Self {
        let url = env::var("REDIS_URL").unwrap_or_else(|_| self.url.clone());
        Self {
            url,
            session_ttl_seconds: self.session_ttl_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub document_dir: String,
}

fn default_batch_size() -> usize {
    16
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_embedding_retries() -> u32 {
    3
}

fn default_llm_retries() -> u32 {
    2
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_dimensions() -> usize {
    1536
}

fn default_models() -> Vec<String> {
    [
        "gpt-3.5-turbo",
        "gpt-4",
        "gpt-4o",
        "gpt-4o-mini",
        "claude-3-5-sonnet-latest",
        "claude-3-haiku-20240307",
        "anthropic.claude-3-5-sonnet-20241022-v2:0",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_env() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| Self::default_config_path());
        Self::load(Path::new(&config_path))
    }

    pub fn default_config_path() -> String {
        "./config.toml".to_string()
    }

    pub fn with_env_overrides(&self) -> Self {
        Self {
            embedding: self.embedding.with_env_overrides(),
            llm: self.llm.with_env_overrides(),
            vector_store: self.vector_store.with_env_overrides(),
            redis: self.redis.as_ref().map(RedisConfig::with_env_overrides),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunking.chunk_size, self.chunking.chunk_overlap)?;
        validate_generation(self.llm.temperature, self.llm.max_tokens)?;

        if !self.llm.models.contains(&self.llm.default_model) {
            return Err(Error::configuration(format!(
                "default model '{}' is not in the supported model list",
                self.llm.default_model
            )));
        }
        if self.retrieval.k == 0 {
            return Err(Error::configuration("retrieval.k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(Error::configuration(format!(
                "retrieval.threshold must be within [0, 1], got {}",
                self.retrieval.threshold
            )));
        }
        if self.embedding.batch_size == 0 || self.embedding.concurrency == 0 {
            return Err(Error::configuration(
                "embedding.batch_size and embedding.concurrency must be at least 1",
            ));
        }
        if self.vector_store.dimensions == 0 {
            return Err(Error::configuration("vector_store.dimensions must be at least 1"));
        }
        Ok(())
    }
}

pub fn validate_chunking(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if !CHUNK_SIZE_RANGE.contains(&chunk_size) {
        return Err(Error::configuration(format!(
            "chunk_size must be within [{}, {}], got {}",
            CHUNK_SIZE_RANGE.start(),
            CHUNK_SIZE_RANGE.end(),
            chunk_size
        )));
    }
    if chunk_overlap >= MAX_CHUNK_OVERLAP {
        return Err(Error::configuration(format!(
            "chunk_overlap must be within [0, {}), got {}",
            MAX_CHUNK_OVERLAP, chunk_overlap
        )));
    }
    Ok(())
}

pub fn validate_generation(temperature: f32, max_tokens: u32) -> Result<()> {
    if !TEMPERATURE_RANGE.contains(&temperature) {
        return Err(Error::configuration(format!(
            "temperature must be within [0, 1], got {}",
            temperature
        )));
    }
    if !MAX_TOKENS_RANGE.contains(&max_tokens) {
        return Err(Error::configuration(format!(
            "max_tokens must be within [{}, {}], got {}",
            MAX_TOKENS_RANGE.start(),
            MAX_TOKENS_RANGE.end(),
            max_tokens
        )));
    }
    Ok(())
}
