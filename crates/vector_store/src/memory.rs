use crate::models::{ChunkRecord, DocumentSummary, SearchResult};
use crate::store::{check_dimension, cosine_similarity, VectorStore};
use akasha_core::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};
use uuid::Uuid;

/// Brute-force cosine search over records held in process memory.
/// Selected with a `memory://` store URL.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<ChunkRecord>>,
    dimensions: usize,
}

impl InMemoryVectorStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ChunkRecord>> {
        self.records.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ChunkRecord>> {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        for record in &records {
            check_dimension(self.dimensions, record.embedding.len(), "Embedding")?;
        }
        debug!("Inserting {} records into memory store", records.len());
        self.write().extend(records);
        Ok(())
    }

    async fn similarity_search(
        &self,
        query_embedding: &[f32],
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchResult>> {
        check_dimension(self.dimensions, query_embedding.len(), "Query embedding")?;

        let mut results: Vec<SearchResult> = self
            .read()
            .iter()
            .map(|record| SearchResult {
                id: record.id,
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                similarity: cosine_similarity(query_embedding, &record.embedding),
            })
            .filter(|result| result.similarity >= threshold)
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(k);

        debug!("Memory store search returned {} results", results.len());
        Ok(results)
    }

    async fn delete(&self, document_id: &Uuid) -> Result<()> {
        let mut records = self.write();
        let before = records.len();
        records.retain(|record| record.metadata.document_id != *document_id);
        let removed = before - records.len();

        if removed == 0 {
            info!("No chunks stored for document {}, nothing to delete", document_id);
        } else {
            info!("Deleted {} chunks of document {}", removed, document_id);
        }
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut summaries: HashMap<Uuid, DocumentSummary> = HashMap::new();
        for record in self.read().iter() {
            summaries
                .entry(record.metadata.document_id)
                .and_modify(|summary| summary.chunk_count += 1)
                .or_insert_with(|| DocumentSummary {
                    document_id: record.metadata.document_id,
                    source: record.metadata.source.clone(),
                    chunk_count: 1,
                    ingested_at: record.metadata.ingested_at,
                });
        }

        let mut summaries: Vec<_> = summaries.into_values().collect();
        summaries.sort_by_key(|summary| (summary.ingested_at, summary.document_id));
        Ok(summaries)
    }
}
