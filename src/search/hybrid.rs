use std::collections::HashMap;

use super::store::{Chunk, RankedHit, RetrieverKind};

/// Aggregate of one chunk's contributions across retrievers, keyed by the
/// content hash of its text rather than object identity.
#[derive(Debug, Clone)]
pub struct FusedHit {
    pub chunk: Chunk,
    pub content_hash: String,
    pub rrf_score: f32,
    pub dense_rank: Option<usize>,
    pub dense_score: Option<f32>,
    pub lexical_rank: Option<usize>,
    pub lexical_score: Option<f32>,
}

impl FusedHit {
    fn new(chunk: Chunk) -> Self {
        let content_hash = chunk.hash.clone();
        Self {
            chunk,
            content_hash,
            rrf_score: 0.0,
            dense_rank: None,
            dense_score: None,
            lexical_rank: None,
            lexical_score: None,
        }
    }

    fn absorb(&mut self, hit: &RankedHit, contribution: f32) {
        self.rrf_score += contribution;
        match hit.retriever {
            RetrieverKind::Dense => {
                self.dense_rank = Some(hit.rank);
                self.dense_score = Some(hit.score);
            }
            RetrieverKind::Lexical => {
                self.lexical_rank = Some(hit.rank);
                self.lexical_score = Some(hit.score);
            }
        }
    }
}

/// Reciprocal rank fusion of the dense and lexical result lists.
///
/// Each hit at 0-based rank `r` contributes `1 / (k + r + 1)`; a chunk
/// retrieved by both lists accumulates the sum, which is what rewards
/// cross-retriever agreement. The dense list is processed first, so ties
/// resolve toward dense ordering deterministically (the final sort is
/// stable). `k = 60` is the constant from the original RRF paper.
pub fn reciprocal_rank_fusion(
    dense: &[RankedHit],
    lexical: &[RankedHit],
    k: f32,
    top_k: usize,
) -> Vec<FusedHit> {
    let mut fused: Vec<FusedHit> = Vec::new();
    let mut by_hash: HashMap<String, usize> = HashMap::new();

    for hit in dense.iter().chain(lexical.iter()) {
        let contribution = 1.0 / (k + hit.rank as f32 + 1.0);
        let idx = *by_hash.entry(hit.chunk.hash.clone()).or_insert_with(|| {
            fused.push(FusedHit::new(hit.chunk.clone()));
            fused.len() - 1
        });
        fused[idx].absorb(hit, contribution);
    }

    fused.sort_by(|a, b| {
        b.rrf_score
            .partial_cmp(&a.rrf_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fused.truncate(top_k);
    fused
}
