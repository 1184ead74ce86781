use std::collections::HashMap;

use super::store::{Chunk, RankedHit, RetrieverKind};

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// In-memory BM25 index over the corpus snapshot. Built lazily once per
/// process by the retriever and read-only afterwards.
pub struct LexicalIndex {
    chunks: Vec<Chunk>,
    term_freqs: Vec<HashMap<String, f32>>,
    doc_freqs: HashMap<String, usize>,
    doc_lens: Vec<f32>,
    avg_doc_len: f32,
}

impl LexicalIndex {
    pub fn build(chunks: Vec<Chunk>) -> Self {
        let mut term_freqs = Vec::with_capacity(chunks.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            let tokens = tokenize(&chunk.text);
            doc_lens.push(tokens.len() as f32);

            let mut tf: HashMap<String, f32> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0.0) += 1.0;
            }
            for term in tf.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(tf);
        }

        let avg_doc_len = if doc_lens.is_empty() {
            0.0
        } else {
            doc_lens.iter().sum::<f32>() / doc_lens.len() as f32
        };

        Self {
            chunks,
            term_freqs,
            doc_freqs,
            doc_lens,
            avg_doc_len,
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Best-first BM25 ranking for a text query. Chunks matching no query
    /// term are omitted.
    pub fn query_top_k(&self, query: &str, k: usize) -> Vec<RankedHit> {
        let query_terms = tokenize(query);
        if query_terms.is_empty() || self.chunks.is_empty() {
            return Vec::new();
        }

        let n = self.chunks.len() as f32;
        let mut scored: Vec<(usize, f32)> = Vec::new();

        for (idx, tf) in self.term_freqs.iter().enumerate() {
            let mut score = 0.0f32;
            for term in &query_terms {
                let Some(freq) = tf.get(term) else { continue };
                let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
                let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                let norm = 1.0 - B + B * self.doc_lens[idx] / self.avg_doc_len;
                score += idf * (freq * (K1 + 1.0)) / (freq + K1 * norm);
            }
            if score > 0.0 {
                scored.push((idx, score));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        scored
            .into_iter()
            .enumerate()
            .map(|(rank, (idx, score))| RankedHit {
                chunk: self.chunks[idx].clone(),
                rank,
                retriever: RetrieverKind::Lexical,
                score,
            })
            .collect()
    }
}

/// Lowercased alphanumeric tokens, single characters dropped.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::store::content_hash;
    use super::*;
    use crate::types::DocKind;
    use chrono::Utc;

    fn make_chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            source_name: "paper.txt".to_string(),
            kind: DocKind::Text,
            page_range: None,
            seq: 0,
            text: text.to_string(),
            hash: content_hash(text),
            embedding: vec![],
            indexed_at: Utc::now(),
        }
    }

    #[test]
    fn test_ranks_matching_chunks_first() {
        let index = LexicalIndex::build(vec![
            make_chunk("1", "retinol cream usage at night"),
            make_chunk("2", "facial puffiness after salty meals"),
            make_chunk("3", "sodium intake and facial puffiness"),
        ]);

        // Only chunk 3 matches both query terms
        let hits = index.query_top_k("sodium puffiness", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "3");
        assert_eq!(hits[0].rank, 0);
        assert_eq!(hits[1].chunk.id, "2");
        assert_eq!(hits[1].rank, 1);
        assert!(hits.iter().all(|h| h.retriever == RetrieverKind::Lexical));
    }

    #[test]
    fn test_no_match_returns_empty() {
        let index = LexicalIndex::build(vec![make_chunk("1", "hello world")]);
        assert!(index.query_top_k("zebra", 10).is_empty());
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let index = LexicalIndex::build(vec![make_chunk("1", "hello world")]);
        assert!(index.query_top_k("a !", 10).is_empty());
    }

    #[test]
    fn test_truncates_to_k() {
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| make_chunk(&i.to_string(), &format!("sodium note number {i}")))
            .collect();
        let index = LexicalIndex::build(chunks);
        let hits = index.query_top_k("sodium", 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].rank, 0);
        assert_eq!(hits[2].rank, 2);
    }

    #[test]
    fn test_empty_index() {
        let index = LexicalIndex::build(vec![]);
        assert!(index.is_empty());
        assert!(index.query_top_k("anything", 5).is_empty());
    }
}
