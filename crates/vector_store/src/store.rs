use crate::models::{ChunkRecord, DocumentSummary, SearchResult};
use akasha_core::{Error, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Persistent (content, embedding, metadata) rows with cosine search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Appends records. No deduplication.
    async fn insert(&self, records: Vec<ChunkRecord>) -> Result<()>;

    /// Up to `k` records scoring at least `threshold`, best first. An empty
    /// store yields an empty vector.
    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Removes every chunk of a document. Unknown ids are a no-op.
    async fn delete(&self, document_id: &Uuid) -> Result<()>;

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;
}

pub(crate) fn check_dimension(expected: usize, actual: usize, what: &str) -> Result<()> {
    if expected != actual {
        return Err(Error::configuration(format!(
            "{} dimension mismatch: expected {}, got {}",
            what, expected, actual
        )));
    }
    Ok(())
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
