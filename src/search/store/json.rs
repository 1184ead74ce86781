use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use super::{cosine_similarity, Chunk, IndexStats, ScoredChunk, VectorStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexData {
    chunks: Vec<Chunk>,
    built_at: Option<DateTime<Utc>>,
}

/// JSON-file vector index with in-memory reads. The whole corpus is written
/// in one atomic rename during the offline build.
pub struct JsonStore {
    path: PathBuf,
    data: RwLock<IndexData>,
}

impl JsonStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(IndexData::default()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn atomic_write(&self, data: &IndexData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("tmp");
        let json = serde_json::to_vec(data)?;
        fs::write(&temp_path, json)?;
        fs::rename(temp_path, &self.path)?;

        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonStore {
    async fn save_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.chunks.extend(chunks);
        data.built_at = Some(Utc::now());
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], limit: usize) -> Result<Vec<ScoredChunk>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;

        let mut results: Vec<ScoredChunk> = data
            .chunks
            .iter()
            .map(|chunk| {
                let score = cosine_similarity(query_vector, &chunk.embedding);
                ScoredChunk::new(chunk.clone(), score)
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn get_all_chunks(&self) -> Result<Vec<Chunk>> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(data.chunks.clone())
    }

    async fn persist(&self) -> Result<()> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;
        self.atomic_write(&data)
    }

    /// Read the persisted index into memory. A missing or corrupt file is an
    /// error here; the service treats it as fatal at startup.
    async fn load(&self) -> Result<()> {
        let content = fs::read(&self.path)
            .with_context(|| format!("cannot read index at {}", self.path.display()))?;
        let loaded: IndexData = serde_json::from_slice(&content)
            .with_context(|| format!("corrupt index at {}", self.path.display()))?;

        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        *data = loaded;

        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let data = self.data.read().map_err(|e| anyhow::anyhow!("{}", e))?;

        let index_size = if self.path.exists() {
            fs::metadata(&self.path)?.len()
        } else {
            0
        };

        let mut sources: Vec<&str> = data.chunks.iter().map(|c| c.source_name.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();

        Ok(IndexStats {
            total_sources: sources.len(),
            total_chunks: data.chunks.len(),
            index_size_bytes: index_size,
            last_built: data.built_at,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut data = self.data.write().map_err(|e| anyhow::anyhow!("{}", e))?;
        data.chunks.clear();
        data.built_at = None;

        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::content_hash;
    use super::*;
    use crate::types::DocKind;
    use tempfile::TempDir;

    fn make_chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            source_name: "paper.pdf".to_string(),
            kind: DocKind::Pdf,
            page_range: Some((0, 3)),
            seq: 0,
            text: text.to_string(),
            hash: content_hash(text),
            embedding,
            indexed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("chunks.json"));

        store
            .save_chunks(vec![
                make_chunk("a", "alpha", vec![1.0, 0.0]),
                make_chunk("b", "beta", vec![0.0, 1.0]),
                make_chunk("c", "gamma", vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, "a");
        assert_eq!(results[1].chunk.id, "c");
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.json");

        let store = JsonStore::new(path.clone());
        store
            .save_chunks(vec![make_chunk("a", "alpha", vec![1.0, 0.0])])
            .await
            .unwrap();
        store.persist().await.unwrap();

        let reopened = JsonStore::new(path);
        reopened.load().await.unwrap();
        let chunks = reopened.get_all_chunks().await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].id, "a");
    }

    #[tokio::test]
    async fn test_load_missing_index_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("nope.json"));
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn test_load_corrupt_index_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks.json");
        fs::write(&path, b"not json at all").unwrap();

        let store = JsonStore::new(path);
        assert!(store.load().await.is_err());
    }
}
