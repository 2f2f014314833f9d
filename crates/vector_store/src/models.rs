use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw extracted text plus its origin. Immutable once chunked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub source: String,
    pub text: String,
    pub ingested_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            text: text.into(),
            ingested_at: Utc::now(),
        }
    }
}

/// Stored alongside every chunk vector; `document_id` groups chunks for
/// deletion and listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub document_id: Uuid,
    pub source: String,
    pub chunk_index: usize,
    pub overlap: usize,
    pub ingested_at: DateTime<Utc>,
}

impl ChunkMetadata {
    pub fn for_document(document: &Document, chunk_index: usize, overlap: usize) -> Self {
        Self {
            document_id: document.id,
            source: document.source.clone(),
            chunk_index,
            overlap,
            ingested_at: document.ingested_at,
        }
    }
}

/// One (content, embedding, metadata) row headed for the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    pub id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    pub fn new(content: String, embedding: Vec<f32>, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            embedding,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub id: Uuid,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub similarity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub document_id: Uuid,
    pub source: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Token usage of one answered question. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(model: impl Into<String>, prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            model: model.into(),
            prompt_tokens,
            completion_tokens,
            created_at: Utc::now(),
        }
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}
