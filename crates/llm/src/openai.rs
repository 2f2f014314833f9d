use crate::models::{
    ChatMessage, ClientConfig, Completion, CompletionRequest, OpenAiChatRequest,
    OpenAiChatResponse,
};
use akasha_core::{Error, Result};
use log::{error, info};
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

pub struct OpenAiClient {
    config: ClientConfig,
    client: Client,
}

impl OpenAiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::configuration(
                "OpenAI chat models require an API key (set OPENAI_API_KEY)",
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
            .run("OpenAI chat completion", || self.try_complete(request))
            .await
    }

    async fn try_complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = OpenAiChatRequest {
            model: &request.model,
            messages: vec![ChatMessage::user(request.prompt.clone())],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        info!("Sending request to OpenAI model: {}", request.model);
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI send error: {:?}", e);
                Error::provider(format!("Failed to send request to OpenAI: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::from_http_status("OpenAI", status, &error_text));
        }

        let parsed: OpenAiChatResponse = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("Failed to parse OpenAI response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::malformed("OpenAI response contained no choices"))?;
        let usage = parsed
            .usage
            .ok_or_else(|| Error::malformed("OpenAI response did not report token usage"))?;

        info!(
            "Received response from OpenAI model: {} (finish_reason={:?})",
            request.model, choice.finish_reason
        );

        Ok(Completion {
            text: choice.message.content,
            model: parsed.model.unwrap_or_else(|| request.model.clone()),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}
