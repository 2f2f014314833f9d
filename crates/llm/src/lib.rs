pub mod anthropic;
pub mod bedrock;
pub mod models;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use bedrock::BedrockClient;
pub use models::{ClientConfig, Completion, CompletionRequest, ModelFamily};
pub use openai::OpenAiClient;

use akasha_core::config::LlmConfig;
use akasha_core::{Error, Result, RetryPolicy};
use async_trait::async_trait;
use log::info;

/// Sends one prompt to one named model and returns the text plus token usage.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        OpenAiClient::complete(self, request).await
    }
}

#[async_trait]
impl CompletionProvider for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        AnthropicClient::complete(self, request).await
    }
}

#[async_trait]
impl CompletionProvider for BedrockClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        BedrockClient::complete(self, request).await
    }
}

/// Dispatches completion requests to the backend that serves the model.
pub struct ModelRouter {
    models: Vec<String>,
    openai: Option<Box<dyn CompletionProvider>>,
    anthropic: Option<Box<dyn CompletionProvider>>,
    bedrock: Option<Box<dyn CompletionProvider>>,
}

impl ModelRouter {
    pub fn new(models: Vec<String>) -> Self {
        Self {
            models,
            openai: None,
            anthropic: None,
            bedrock: None,
        }
    }

    pub fn with_backend(mut self, family: ModelFamily, backend: Box<dyn CompletionProvider>) -> Self {
        match family {
            ModelFamily::OpenAi => self.openai = Some(backend),
            ModelFamily::Anthropic => self.anthropic = Some(backend),
            ModelFamily::Bedrock => self.bedrock = Some(backend),
        }
        self
    }

    /// Listed models whose backend is configured, in configuration order.
    pub fn models(&self) -> Vec<String> {
        self.models
            .iter()
            .filter(|model| {
                ModelFamily::of(model)
                    .map(|family| self.backend(family).is_some())
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn backend(&self, family: ModelFamily) -> Option<&dyn CompletionProvider> {
        match family {
            ModelFamily::OpenAi => self.openai.as_deref(),
            ModelFamily::Anthropic => self.anthropic.as_deref(),
            ModelFamily::Bedrock => self.bedrock.as_deref(),
        }
    }

    fn resolve(&self, model: &str) -> Result<&dyn CompletionProvider> {
        if !self.models.iter().any(|m| m == model) {
            return Err(Error::configuration(format!(
                "Model '{}' is not available; choose one of: {}",
                model,
                self.models().join(", ")
            )));
        }
        let family = ModelFamily::of(model)?;
        self.backend(family).ok_or_else(|| {
            Error::configuration(format!(
                "Model '{}' is listed but no {:?} backend is configured",
                model, family
            ))
        })
    }
}

#[async_trait]
impl CompletionProvider for ModelRouter {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        request.validate()?;
        let backend = self.resolve(&request.model)?;
        backend.complete(request).await
    }
}

/// Builds a router with a backend for every family that has credentials.
pub async fn create_completion_provider(cfg: &LlmConfig) -> Result<ModelRouter> {
    let retry = RetryPolicy::new(cfg.max_retries, 1000);
    let mut router = ModelRouter::new(cfg.available_models());

    if let Some(api_key) = cfg.openai_api_key.as_ref().filter(|k| !k.is_empty()) {
        let client = OpenAiClient::new(ClientConfig {
            api_key: api_key.clone(),
            base_url: cfg
                .openai_base_url
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_OPENAI_BASE_URL.to_string()),
            timeout_secs: cfg.timeout_secs,
            retry,
        })?;
        router = router.with_backend(ModelFamily::OpenAi, Box::new(client));
    }

    if let Some(api_key) = cfg.anthropic_api_key.as_ref().filter(|k| !k.is_empty()) {
        let client = AnthropicClient::new(ClientConfig {
            api_key: api_key.clone(),
            base_url: cfg
                .anthropic_base_url
                .clone()
                .unwrap_or_else(|| anthropic::DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            timeout_secs: cfg.timeout_secs,
            retry,
        })?;
        router = router.with_backend(ModelFamily::Anthropic, Box::new(client));
    }

    if let Some(region) = &cfg.aws_region {
        let client = BedrockClient::new_with_region(retry, region).await?;
        router = router.with_backend(ModelFamily::Bedrock, Box::new(client));
    }

    info!("Completion models available: {:?}", router.models());
    Ok(router)
}
