use crate::prompts::Language;
use akasha_core::config::{validate_chunking, validate_generation};
use akasha_core::{Config, Error, Result, RetryPolicy};
use embeddings::ChunkConfig;
use std::time::Duration;

/// Everything one question needs besides the question itself. Built from
/// the loaded config, then overridden per request.
#[derive(Debug, Clone, PartialEq)]
pub struct QaSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub k: usize,
    pub threshold: f32,
    /// `None` detects the language from the question.
    pub language: Option<Language>,
    pub timeout: Duration,
    pub search_retry: RetryPolicy,
}

impl QaSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.1,
            max_tokens: 1024,
            k: 3,
            threshold: 0.5,
            language: None,
            timeout: Duration::from_secs(30),
            search_retry: RetryPolicy::new(2, 500),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            model: cfg.llm.default_model.clone(),
            temperature: cfg.llm.temperature,
            max_tokens: cfg.llm.max_tokens,
            k: cfg.retrieval.k,
            threshold: cfg.retrieval.threshold,
            language: None,
            timeout: cfg.retrieval.timeout(),
            search_retry: cfg.retrieval.retry_policy(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(Error::configuration("model must not be empty"));
        }
        validate_generation(self.temperature, self.max_tokens)?;
        if self.k == 0 {
            return Err(Error::configuration("k must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::configuration(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Chunking parameters for one ingestion batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 0,
        }
    }
}

impl ChunkSettings {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.chunking.chunk_size, cfg.chunking.chunk_overlap)
    }

    /// Applies the optional per-request overrides.
    pub fn overridden(self, chunk_size: Option<usize>, chunk_overlap: Option<usize>) -> Self {
        Self {
            chunk_size: chunk_size.unwrap_or(self.chunk_size),
            chunk_overlap: chunk_overlap.unwrap_or(self.chunk_overlap),
        }
    }

    /// Enforces the user-facing ranges, which are narrower than what the
    /// chunker itself accepts.
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunk_size, self.chunk_overlap)
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.chunk_size,
            overlap_size: self.chunk_overlap,
        }
    }
}
