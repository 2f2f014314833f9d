use crate::condenser::QuestionCondenser;
use crate::models::{QaAnswer, QaState, TokenUsage};
use crate::prompts::Language;
use crate::settings::QaSettings;
use akasha_core::{ChatTurn, Error, HistoryStore, Result};
use embeddings::EmbeddingProvider;
use llm::{CompletionProvider, CompletionRequest};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vector_store::{StatsRecorder, UsageRecord, VectorStore};

/// A question that ended in Failed, with the last state it reached.
#[derive(Debug, Clone, PartialEq, ThisError)]
#[error("question failed after {reached}: {source}")]
pub struct QaError {
    pub reached: QaState,
    #[source]
    pub source: Error,
}

impl QaError {
    fn new(reached: QaState, source: Error) -> Self {
        Self { reached, source }
    }
}

impl From<QaError> for Error {
    fn from(err: QaError) -> Self {
        err.source
    }
}

/// Condense, embed, search, prompt, complete. On success the turn is
/// appended to the session history and a usage record is written.
pub struct RetrievalQa {
    condenser: QuestionCondenser,
    completion: Arc<dyn CompletionProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    history: Arc<dyn HistoryStore>,
    stats: Arc<dyn StatsRecorder>,
}

/// Tracks visited states and tags failures with the last one reached.
struct Run {
    states: Vec<QaState>,
}

impl Run {
    fn new() -> Self {
        Self {
            states: vec![QaState::Received],
        }
    }

    fn reached(&self) -> QaState {
        self.states
            .last()
            .copied()
            .unwrap_or(QaState::Received)
    }

    fn advance(&mut self, state: QaState) {
        debug!("{} -> {}", self.reached(), state);
        self.states.push(state);
    }

    fn fail(&self, source: Error) -> QaError {
        warn!("Question failed after {}: {}", self.reached(), source);
        QaError::new(self.reached(), source)
    }
}

async fn with_timeout<T>(
    limit: Duration,
    stage: &str,
    on_timeout: fn(String) -> Error,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| Err(on_timeout(format!("{} timed out after {:?}", stage, limit))))
}

fn provider_timeout(message: String) -> Error {
    Error::provider(message)
}

fn storage_timeout(message: String) -> Error {
    Error::storage(message)
}

impl RetrievalQa {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        history: Arc<dyn HistoryStore>,
        stats: Arc<dyn StatsRecorder>,
    ) -> Self {
        Self {
            condenser: QuestionCondenser::new(completion.clone()),
            completion,
            embedder,
            store,
            history,
            stats,
        }
    }

    pub async fn ask(
        &self,
        session_id: &Uuid,
        question: &str,
        settings: &QaSettings,
    ) -> std::result::Result<QaAnswer, QaError> {
        let mut run = Run::new();
        info!("Question received for session {}", session_id);

        settings.validate().map_err(|e| run.fail(e))?;
        if question.trim().is_empty() {
            return Err(run.fail(Error::configuration("question must not be empty")));
        }
        let history = self
            .history
            .load(session_id)
            .await
            .map_err(|e| run.fail(e))?;
        let language = settings
            .language
            .unwrap_or_else(|| Language::detect(question));
        let mut usage = TokenUsage::default();

        let condensed = with_timeout(
            settings.timeout,
            "Question condensation",
            provider_timeout,
            self.condenser
                .condense(&history, question, settings, language),
        )
        .await
        .map_err(|e| run.fail(e))?;
        usage += condensed.usage;
        let standalone_question = condensed.question;
        run.advance(QaState::Condensed);

        let query_embedding = with_timeout(
            settings.timeout,
            "Query embedding",
            provider_timeout,
            self.embedder.embed_query(standalone_question.clone()),
        )
        .await
        .map_err(|e| run.fail(e))?;
        run.advance(QaState::Embedded);

        let sources = settings
            .search_retry
            .run("Vector store search", || {
                with_timeout(
                    settings.timeout,
                    "Vector store search",
                    storage_timeout,
                    self.store
                        .similarity_search(&query_embedding, settings.k, settings.threshold),
                )
            })
            .await
            .map_err(|e| run.fail(e))?;
        debug!("Retrieved {} context chunks", sources.len());
        run.advance(QaState::Retrieved);

        let context: Vec<&str> = sources.iter().map(|s| s.content.as_str()).collect();
        let prompt = language
            .prompts()
            .qa_prompt(&context, &standalone_question);
        let request = CompletionRequest::new(prompt, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);
        let completion = with_timeout(
            settings.timeout,
            "Answer completion",
            provider_timeout,
            self.completion.complete(&request),
        )
        .await
        .map_err(|e| run.fail(e))?;
        let answer = completion.text.trim().to_string();
        if answer.is_empty() {
            return Err(run.fail(Error::malformed(format!(
                "{} returned an empty answer",
                settings.model
            ))));
        }
        usage += TokenUsage::from(&completion);
        run.advance(QaState::Answered);

        self.history
            .append(session_id, ChatTurn::new(question, answer.clone()))
            .await
            .map_err(|e| run.fail(e))?;

        let record = UsageRecord::new(
            settings.model.clone(),
            usage.prompt_tokens,
            usage.completion_tokens,
        );
        if let Err(e) = self.stats.record(record).await {
            warn!("Failed to record usage for {}: {}", settings.model, e);
        }

        run.advance(QaState::Succeeded);
        info!(
            "Question answered with {} using {} sources ({} tokens)",
            settings.model,
            sources.len(),
            usage.total()
        );

        Ok(QaAnswer {
            answer,
            standalone_question,
            sources,
            model: settings.model.clone(),
            usage,
            states: run.states,
        })
    }
}
