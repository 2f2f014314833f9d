use crate::models::{
    AnthropicRequest, AnthropicResponse, ChatMessage, ClientConfig, Completion, CompletionRequest,
};
use akasha_core::{Error, Result};
use log::{error, info};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    config: ClientConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::configuration(
                "Claude models require an API key (set ANTHROPIC_API_KEY)",
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.config
            .retry
            .run("Anthropic message", || self.try_complete(request))
            .await
    }

    async fn try_complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![ChatMessage::user(request.prompt.clone())],
        };

        info!("Sending request to Anthropic model: {}", request.model);
        let response = self
            .client
            .post(format!("{}/v1/messages", self.config.base_url))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Anthropic send error: {:?}", e);
                Error::provider(format!("Failed to send request to Anthropic: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_http_status("Anthropic", status, &error_text));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("Failed to parse Anthropic response: {}", e)))?;

        let text: String = parsed
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        info!(
            "Received response from Anthropic model: {} (stop_reason={:?})",
            request.model, parsed.stop_reason
        );

        Ok(Completion {
            text,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            prompt_tokens: parsed.usage.input_tokens,
            completion_tokens: parsed.usage.output_tokens,
        })
    }
}
