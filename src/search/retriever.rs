use anyhow::Result;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::embedder::Embedder;
use super::lexical::LexicalIndex;
use super::store::{RankedHit, RetrieverKind, VectorStore};

/// Both retrievers' ranked lists for one query, plus whether the lexical
/// side was unavailable.
#[derive(Debug)]
pub struct RetrievalOutcome {
    pub dense: Vec<RankedHit>,
    pub lexical: Vec<RankedHit>,
    pub lexical_degraded: bool,
}

/// Dual retrieval over the shared vector store. The lexical index is built
/// from the corpus snapshot on first use, behind a single-acquisition
/// barrier so concurrent first requests cannot race to build it twice. A
/// failed build degrades this process to dense-only permanently.
pub struct HybridRetriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    lexical: OnceCell<Option<Arc<LexicalIndex>>>,
    top_k: usize,
}

impl HybridRetriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            lexical: OnceCell::new(),
            top_k,
        }
    }

    /// Run dense and lexical retrieval concurrently; they have no data
    /// dependency on each other.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalOutcome> {
        let (dense, lexical) = tokio::join!(self.dense_top_k(query), self.lexical_top_k(query));

        let dense = dense?;
        let (lexical, lexical_degraded) = lexical;

        debug!(
            dense_hits = dense.len(),
            lexical_hits = lexical.len(),
            lexical_degraded,
            "retrieval complete"
        );

        Ok(RetrievalOutcome {
            dense,
            lexical,
            lexical_degraded,
        })
    }

    async fn dense_top_k(&self, query: &str) -> Result<Vec<RankedHit>> {
        let query_vector = self.embedder.embed(query).await?;
        let scored = self.store.search(&query_vector, self.top_k).await?;

        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, s)| RankedHit {
                chunk: s.chunk,
                rank,
                retriever: RetrieverKind::Dense,
                score: s.score,
            })
            .collect())
    }

    async fn lexical_top_k(&self, query: &str) -> (Vec<RankedHit>, bool) {
        match self.lexical_index().await {
            Some(index) => (index.query_top_k(query, self.top_k), false),
            None => (Vec::new(), true),
        }
    }

    async fn lexical_index(&self) -> Option<Arc<LexicalIndex>> {
        self.lexical
            .get_or_init(|| async {
                match self.store.get_all_chunks().await {
                    Ok(chunks) => {
                        let index = LexicalIndex::build(chunks);
                        debug!(chunks = index.len(), "lexical index built");
                        Some(Arc::new(index))
                    }
                    Err(e) => {
                        warn!("lexical index build failed, degrading to dense-only: {e:#}");
                        None
                    }
                }
            })
            .await
            .clone()
    }
}
