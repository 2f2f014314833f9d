//! Deterministic stand-ins for the external services.
use akasha_core::{Error, Result};
use async_trait::async_trait;
use embeddings::{EmbedFuture, EmbeddingProvider};
use llm::{Completion, CompletionProvider, CompletionRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;
use vector_store::{ChunkRecord, DocumentSummary, SearchResult, VectorStore};

/// Embeds text as [fox count, dog count, 0.1].
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        vec![
            lower.matches("fox").count() as f32,
            lower.matches("dog").count() as f32,
            0.1,
        ]
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn embed(&self, texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(async move { Ok(texts.iter().map(|t| Self::vector(t)).collect()) })
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Replies from a queue, then with a fixed fallback answer. Every call
/// reports 10 prompt and 5 completion tokens.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let text = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "I don't know.".to_string());
        Ok(Completion {
            text,
            model: request.model.clone(),
            prompt_tokens: 10,
            completion_tokens: 5,
        })
    }
}

/// Every operation fails as if the database were unreachable.
pub struct UnreachableStore {
    pub searches: AtomicUsize,
}

impl UnreachableStore {
    pub fn new() -> Self {
        Self {
            searches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl VectorStore for UnreachableStore {
    async fn insert(&self, _records: Vec<ChunkRecord>) -> Result<()> {
        Err(Error::storage("connection refused"))
    }

    async fn similarity_search(
        &self,
        _query_embedding: &[f32],
        _k: usize,
        _threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        Err(Error::storage("connection refused"))
    }

    async fn delete(&self, _document_id: &Uuid) -> Result<()> {
        Err(Error::storage("connection refused"))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        Err(Error::storage("connection refused"))
    }
}

/// Never answers a search within any reasonable timeout.
pub struct StalledStore;

#[async_trait]
impl VectorStore for StalledStore {
    async fn insert(&self, _records: Vec<ChunkRecord>) -> Result<()> {
        Ok(())
    }

    async fn similarity_search(
        &self,
        _query_embedding: &[f32],
        _k: usize,
        _threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn delete(&self, _document_id: &Uuid) -> Result<()> {
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        Ok(Vec::new())
    }
}

/// An embedding service that is down.
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _texts: Vec<String>) -> EmbedFuture<'_> {
        Box::pin(async { Err(Error::provider("embedding service unavailable")) })
    }

    fn dimension(&self) -> usize {
        3
    }
}

/// Answers the first `succeed` calls, then fails like an overloaded API.
pub struct FailingCompletion {
    succeed: usize,
    calls: AtomicUsize,
}

impl FailingCompletion {
    pub fn after(succeed: usize) -> Self {
        Self {
            succeed,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FailingCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.succeed {
            return Err(Error::from_http_status("OpenAI", 503, "overloaded"));
        }
        Ok(Completion {
            text: "It jumped.".to_string(),
            model: request.model.clone(),
            prompt_tokens: 10,
            completion_tokens: 5,
        })
    }
}
