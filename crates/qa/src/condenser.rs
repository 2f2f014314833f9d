use crate::models::{Condensation, TokenUsage};
use crate::prompts::Language;
use crate::settings::QaSettings;
use akasha_core::{ChatHistory, Error, Result};
use llm::{CompletionProvider, CompletionRequest};
use std::sync::Arc;
use tracing::debug;

/// Rewrites a follow-up question into one that stands on its own, using the
/// conversation so far.
pub struct QuestionCondenser {
    completion: Arc<dyn CompletionProvider>,
}

impl QuestionCondenser {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// With no history the follow-up is already standalone and the model is
    /// not called.
    pub async fn condense(
        &self,
        history: &ChatHistory,
        follow_up: &str,
        settings: &QaSettings,
        language: Language,
    ) -> Result<Condensation> {
        if history.is_empty() {
            debug!("Empty chat history, using follow-up as standalone question");
            return Ok(Condensation {
                question: follow_up.to_string(),
                usage: TokenUsage::default(),
            });
        }

        let prompt = language.prompts().condense_prompt(history, follow_up);
        let request = CompletionRequest::new(prompt, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);

        let completion = self.completion.complete(&request).await?;
        let question = completion.text.trim();
        if question.is_empty() {
            return Err(Error::malformed(format!(
                "{} returned an empty standalone question",
                completion.model
            )));
        }

        debug!("Condensed '{}' into '{}'", follow_up, question);
        Ok(Condensation {
            question: question.to_string(),
            usage: TokenUsage::from(&completion),
        })
    }
}
