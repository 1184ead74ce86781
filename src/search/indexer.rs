use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::ingest::DocumentLoader;

use super::chunker::{ChunkDraft, Chunker};
use super::embedder::Embedder;
use super::store::{Chunk, VectorStore};

const EMBED_BATCH_SIZE: usize = 32;

/// Offline corpus build: ingest -> chunk -> embed -> persist. The index is
/// always rebuilt whole; there is no incremental path.
pub struct IndexBuilder {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
}

pub struct BuildReport {
    pub documents_loaded: usize,
    pub chunks_created: usize,
}

impl IndexBuilder {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, chunker: Chunker) -> Self {
        Self {
            store,
            embedder,
            chunker,
        }
    }

    pub async fn build(&self, loader: &DocumentLoader) -> Result<BuildReport> {
        let documents = loader.load_documents();
        if documents.is_empty() {
            anyhow::bail!("no documents could be loaded; add PDF or TXT files to the corpus folder");
        }

        let drafts = self.chunker.chunk_documents(&documents);
        info!(
            documents = documents.len(),
            chunks = drafts.len(),
            "corpus chunked"
        );

        let chunks = self.embed_drafts(drafts).await?;
        let chunk_count = chunks.len();

        self.store.clear().await?;
        self.store.save_chunks(chunks).await?;
        self.store.persist().await?;

        Ok(BuildReport {
            documents_loaded: documents.len(),
            chunks_created: chunk_count,
        })
    }

    async fn embed_drafts(&self, drafts: Vec<ChunkDraft>) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::with_capacity(drafts.len());

        for batch in drafts.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            for (draft, embedding) in batch.iter().zip(embeddings.into_iter()) {
                chunks.push(Chunk {
                    id: format!("{}:{}", draft.source_name, draft.seq),
                    source_name: draft.source_name.clone(),
                    kind: draft.kind,
                    page_range: draft.page_range,
                    seq: draft.seq,
                    text: draft.text.clone(),
                    hash: draft.hash.clone(),
                    embedding,
                    indexed_at: Utc::now(),
                });
            }
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::JsonStore;
    use super::*;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| vec![1.0, i as f32])
                .collect())
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn long_text() -> String {
        (0..30)
            .map(|i| format!("Observation {i} on hydration and barrier function of skin"))
            .collect::<Vec<_>>()
            .join(". ")
    }

    #[tokio::test]
    async fn test_build_persists_embedded_chunks() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("paper.txt"), long_text()).unwrap();

        let index_path = dir.path().join("index/chunks.json");
        let store = Arc::new(JsonStore::new(index_path.clone()));
        let builder = IndexBuilder::new(
            store.clone(),
            Arc::new(StubEmbedder),
            Chunker::new(200, 50, 40),
        );

        let report = builder
            .build(&DocumentLoader::new(dir.path()))
            .await
            .unwrap();

        assert_eq!(report.documents_loaded, 1);
        assert!(report.chunks_created > 1);
        assert!(index_path.exists());

        let chunks = store.get_all_chunks().await.unwrap();
        assert_eq!(chunks.len(), report.chunks_created);
        assert!(chunks.iter().all(|c| c.embedding.len() == 2));
        assert!(chunks.iter().all(|c| c.id.starts_with("paper.txt:")));
    }

    #[tokio::test]
    async fn test_build_fails_on_empty_corpus() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(JsonStore::new(dir.path().join("chunks.json")));
        let builder = IndexBuilder::new(store, Arc::new(StubEmbedder), Chunker::new(200, 50, 40));

        assert!(builder.build(&DocumentLoader::new(dir.path())).await.is_err());
    }
}
