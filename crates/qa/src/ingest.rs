use crate::settings::ChunkSettings;
use akasha_core::{Error, Result};
use embeddings::{EmbeddingProvider, TextChunk, TextChunker};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use vector_store::{ChunkMetadata, ChunkRecord, Document, VectorStore};

const PRELOAD_EXTENSIONS: [&str; 2] = ["txt", "md"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub source: String,
    pub chunks: usize,
}

/// Write path: chunk, embed in batches, insert. Batches run concurrently;
/// a failed batch leaves batches already inserted in place.
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    concurrency: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
        }
    }

    pub async fn ingest(&self, document: &Document, settings: &ChunkSettings) -> Result<IngestReport> {
        settings.validate()?;
        let chunker = TextChunker::new(settings.chunk_config())?;
        let chunks = chunker.chunk_text(&document.text);

        info!(
            "Ingesting {} ({} chars) as {} chunks",
            document.source,
            document.text.chars().count(),
            chunks.len()
        );

        stream::iter(chunks.chunks(self.batch_size).map(Ok::<_, Error>))
            .try_for_each_concurrent(self.concurrency, |batch| self.ingest_batch(document, batch))
            .await?;

        Ok(IngestReport {
            document_id: document.id,
            source: document.source.clone(),
            chunks: chunks.len(),
        })
    }

    async fn ingest_batch(&self, document: &Document, batch: &[TextChunk]) -> Result<()> {
        let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
        let embeddings = self.embedder.embed(texts).await?;
        if embeddings.len() != batch.len() {
            return Err(Error::malformed(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        let records = batch
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                ChunkRecord::new(
                    chunk.content.clone(),
                    embedding,
                    ChunkMetadata::for_document(document, chunk.chunk_id, chunk.overlap),
                )
            })
            .collect();
        self.store.insert(records).await
    }

    /// Ingests every `.txt`/`.md` file directly under `dir`. Files that fail
    /// are logged and skipped.
    pub async fn preload_dir(&self, dir: &Path, settings: &ChunkSettings) -> Result<Vec<IngestReport>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            Error::configuration(format!("Cannot read document dir {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::configuration(format!("Cannot list {}: {}", dir.display(), e)))?
        {
            let path = entry.path();
            let wanted = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| PRELOAD_EXTENSIONS.contains(&ext));
            if wanted && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();

        let reports = stream::iter(paths)
            .then(|path| async move {
                let outcome = match tokio::fs::read_to_string(&path).await {
                    Ok(text) => {
                        let source = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string());
                        self.ingest(&Document::new(source, text), settings).await
                    }
                    Err(e) => Err(Error::configuration(format!("Cannot read file: {}", e))),
                };
                match outcome {
                    Ok(report) => Some(report),
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .filter_map(|report| async move { report })
            .collect::<Vec<_>>()
            .await;

        info!("Preloaded {} documents from {}", reports.len(), dir.display());
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{KeywordEmbedder, UnreachableStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vector_store::InMemoryVectorStore;

    const FOX_TEXT: &str = "The quick brown fox. The lazy dog sleeps.";

    /// Keyword embedder that counts calls and batch sizes.
    struct CountingEmbedder {
        calls: AtomicUsize,
        largest_batch: AtomicUsize,
    }

    impl EmbeddingProvider for CountingEmbedder {
        fn embed(&self, texts: Vec<String>) -> embeddings::EmbedFuture<'_> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.largest_batch.fetch_max(texts.len(), Ordering::SeqCst);
            Box::pin(async move { Ok(texts.iter().map(|t| KeywordEmbedder::vector(t)).collect()) })
        }

        fn dimension(&self) -> usize {
            3
        }
    }

    #[tokio::test]
    async fn should_store_every_chunk_with_metadata() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(Arc::new(KeywordEmbedder), store.clone(), 16, 4);
        let document = Document::new("animals.txt", FOX_TEXT.repeat(10));

        let report = ingestor
            .ingest(&document, &ChunkSettings::new(100, 20))
            .await
            .unwrap();

        assert_eq!(report.document_id, document.id);
        assert!(report.chunks > 1);
        assert_eq!(store.len(), report.chunks);

        let summaries = store.list_documents().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].source, "animals.txt");
        assert_eq!(summaries[0].chunk_count, report.chunks);
    }

    #[tokio::test]
    async fn should_embed_in_bounded_batches() {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            largest_batch: AtomicUsize::new(0),
        });
        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(embedder.clone(), store.clone(), 2, 3);

        let report = ingestor
            .ingest(
                &Document::new("long.txt", FOX_TEXT.repeat(20)),
                &ChunkSettings::new(100, 0),
            )
            .await
            .unwrap();

        assert_eq!(embedder.largest_batch.load(Ordering::SeqCst), 2);
        assert_eq!(
            embedder.calls.load(Ordering::SeqCst),
            report.chunks.div_ceil(2)
        );
        assert_eq!(store.len(), report.chunks);
    }

    #[tokio::test]
    async fn should_ingest_empty_text_as_zero_chunks() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(Arc::new(KeywordEmbedder), store.clone(), 16, 4);

        let report = ingestor
            .ingest(&Document::new("empty.txt", ""), &ChunkSettings::default())
            .await
            .unwrap();

        assert_eq!(report.chunks, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn should_reject_out_of_range_chunk_settings() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(Arc::new(KeywordEmbedder), store, 16, 4);

        let result = ingestor
            .ingest(&Document::new("a.txt", FOX_TEXT), &ChunkSettings::new(20, 5))
            .await;

        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[tokio::test]
    async fn should_surface_storage_errors() {
        let ingestor = Ingestor::new(
            Arc::new(KeywordEmbedder),
            Arc::new(UnreachableStore::new()),
            16,
            4,
        );

        let result = ingestor
            .ingest(&Document::new("a.txt", FOX_TEXT), &ChunkSettings::default())
            .await;

        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn should_preload_text_and_markdown_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fox.txt"), FOX_TEXT).unwrap();
        std::fs::write(dir.path().join("notes.md"), "# Dogs\nThe dog sleeps.").unwrap();
        std::fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(Arc::new(KeywordEmbedder), store.clone(), 16, 4);

        let reports = ingestor
            .preload_dir(dir.path(), &ChunkSettings::default())
            .await
            .unwrap();

        let sources: Vec<_> = reports.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, vec!["fox.txt", "notes.md"]);
        assert_eq!(store.list_documents().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_fail_preload_for_missing_dir() {
        let store = Arc::new(InMemoryVectorStore::new(3));
        let ingestor = Ingestor::new(Arc::new(KeywordEmbedder), store, 16, 4);

        let result = ingestor
            .preload_dir(Path::new("/nonexistent/akasha/docs"), &ChunkSettings::default())
            .await;

        assert!(result.is_err());
    }
}
