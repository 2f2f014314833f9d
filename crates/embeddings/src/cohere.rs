use akasha_core::{Error, Result, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CohereConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    /// Vector length the model produces.
    pub dimensions: usize,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for CohereConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "embed-multilingual-v3.0".to_string(),
            base_url: "https://api.cohere.ai".to_string(),
            dimensions: 1024,
            timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

/// Output size of a Cohere v3 embedding model: 384 for the light
/// variants, 1024 otherwise.
pub fn model_dimensions(model: &str) -> usize {
    if model.contains("-light-") {
        384
    } else {
        1024
    }
}

/// Cohere v3 models embed documents and queries differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    SearchDocument,
    SearchQuery,
}

impl InputType {
    fn as_str(self) -> &'static str {
        match self {
            InputType::SearchDocument => "search_document",
            InputType::SearchQuery => "search_query",
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    texts: Vec<String>,
    model: String,
    input_type: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct CohereClient {
    config: CohereConfig,
    client: Client,
}

impl CohereClient {
    pub fn new(config: CohereConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::configuration(
                "Cohere embeddings require an API key (set COHERE_API_KEY)",
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
        self.embed_as(texts, InputType::SearchDocument).await
    }

    pub async fn embed_as(&self, texts: Vec<String>, input_type: InputType) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        self.config
            .retry
            .run("Cohere embedding request", || self.try_embed(&texts, input_type))
            .await
    }

    async fn try_embed(&self, texts: &[String], input_type: InputType) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            texts: texts.to_vec(),
            model: self.config.model.clone(),
            input_type: input_type.as_str().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embed", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::provider(format!("Failed to send request to Cohere API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_http_status("Cohere", status, &error_text));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("Failed to parse Cohere API response: {}", e)))?;

        if embed_response.embeddings.len() != texts.len() {
            return Err(Error::malformed(format!(
                "Cohere returned {} embeddings for {} inputs",
                embed_response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(embed_response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn should_create_cohere_client_with_custom_config() {
        let config = CohereConfig {
            api_key: "test-key".to_string(), // pragma: allowlist secret
            model: "embed-english-v3.0".to_string(),
            base_url: "https://custom.api.com".to_string(),
            dimensions: 1024,
            timeout_secs: 60,
            retry: RetryPolicy::new(5, 100),
        };

        let client = CohereClient::new(config).unwrap();
        assert_eq!(client.config.model, "embed-english-v3.0");
        assert_eq!(client.config.base_url, "https://custom.api.com");
        assert_eq!(client.config.timeout_secs, 60);
        assert_eq!(client.config.retry.max_retries, 5);
    }

    #[test]
    fn should_size_light_models_smaller() {
        assert_eq!(model_dimensions("embed-english-light-v3.0"), 384);
        assert_eq!(model_dimensions("embed-multilingual-light-v3.0"), 384);
        assert_eq!(model_dimensions("embed-english-v3.0"), 1024);
    }

    #[test]
    fn should_require_api_key() {
        assert!(CohereClient::new(CohereConfig::default()).is_err());
    }

    #[tokio::test]
    async fn should_send_query_input_type_for_queries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .and(body_partial_json(json!({"input_type": "search_query"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[0.5, 0.5]]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CohereClient::new(CohereConfig {
            api_key: "mock-key".to_string(), // pragma: allowlist secret
            base_url: server.uri(),
            retry: RetryPolicy::none(),
            ..CohereConfig::default()
        })
        .unwrap();

        let result = client
            .embed_as(vec!["Where is the fox?".to_string()], InputType::SearchQuery)
            .await
            .unwrap();

        assert_eq!(result, vec![vec![0.5, 0.5]]);
    }

    #[tokio::test]
    async fn should_retry_on_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let client = CohereClient::new(CohereConfig {
            api_key: "mock-key".to_string(), // pragma: allowlist secret
            base_url: server.uri(),
            retry: RetryPolicy::new(1, 0),
            ..CohereConfig::default()
        })
        .unwrap();

        let result = client.embed(vec!["test".to_string()]).await;
        assert!(result.unwrap_err().is_retryable());
    }

    #[test]
    fn should_create_embed_request_with_correct_format() {
        let request = EmbedRequest {
            texts: vec!["test text".to_string()],
            model: "embed-multilingual-v3.0".to_string(),
            input_type: InputType::SearchDocument.as_str().to_string(),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("test text"));
        assert!(json.contains("embed-multilingual-v3.0"));
        assert!(json.contains("search_document"));
    }
}
