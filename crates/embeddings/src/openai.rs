use akasha_core::{Error, Result, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for OpenAiEmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "text-embedding-ada-002".to_string(),
            base_url: "https://api.openai.com".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Only the text-embedding-3 family accepts a requested output size.
fn requested_dimensions(model: &str, dimensions: usize) -> Option<usize> {
    model
        .starts_with("text-embedding-3")
        .then_some(dimensions)
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct OpenAiEmbeddingClient {
    config: OpenAiEmbeddingConfig,
    client: Client,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: OpenAiEmbeddingConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::configuration(
                "OpenAI embeddings require an API key (set OPENAI_API_KEY)",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    pub async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.config
            .retry
            .run("OpenAI embedding request", || self.try_embed(&texts))
            .await
    }

    async fn try_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: texts,
            dimensions: requested_dimensions(&self.config.model, self.config.dimensions),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to OpenAI API: {}", e);
                Error::provider(format!("Failed to send request to OpenAI API: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_http_status("OpenAI", status, &error_text));
        }

        let mut embed_response: EmbedResponse = response.json().await.map_err(|e| {
            Error::malformed(format!("Failed to parse OpenAI API response: {}", e))
        })?;

        if embed_response.data.len() != texts.len() {
            return Err(Error::malformed(format!(
                "OpenAI returned {} embeddings for {} inputs",
                embed_response.data.len(),
                texts.len()
            )));
        }

        // The API documents `index` as the input position; do not rely on array order.
        embed_response.data.sort_by_key(|d| d.index);
        Ok(embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect())
    }
}
