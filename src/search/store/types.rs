use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::DocKind;

/// A bounded, overlap-aware slice of a source document — the unit of
/// retrieval. Embedding vectors live on the stored chunk and are owned by
/// the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub source_name: String,
    pub kind: DocKind,
    /// Page range of the parent document, for PDFs.
    pub page_range: Option<(usize, usize)>,
    /// Position of this chunk within its parent document.
    pub seq: usize,
    pub text: String,
    /// 16-hex SHA-256 of the chunk text. Retrievers may hand back distinct
    /// objects with identical content; fusion dedups on this.
    pub hash: String,
    pub embedding: Vec<f32>,
    pub indexed_at: DateTime<Utc>,
}

/// Which retriever produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    Dense,
    Lexical,
}

/// One retriever's hit at a given rank, best-first, 0-based.
#[derive(Debug, Clone)]
pub struct RankedHit {
    pub chunk: Chunk,
    pub rank: usize,
    pub retriever: RetrieverKind,
    /// Native score in the retriever's own scale (cosine or BM25).
    pub score: f32,
}

/// Store-level similarity hit, before rank assignment.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_sources: usize,
    pub total_chunks: usize,
    pub index_size_bytes: u64,
    pub last_built: Option<DateTime<Utc>>,
}

/// 16-hex content hash used for chunk identity across retrievers.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_stable() {
        let h1 = content_hash("hello");
        let h2 = content_hash("hello");
        let h3 = content_hash("world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 16);
    }
}
