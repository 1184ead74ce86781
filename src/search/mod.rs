pub mod chunker;
pub mod embedder;
pub mod hybrid;
pub mod indexer;
pub mod lexical;
pub mod retriever;
pub mod store;

pub use chunker::{ChunkDraft, Chunker};
pub use embedder::{create_embedder, Embedder, RemoteEmbedder};
pub use hybrid::{reciprocal_rank_fusion, FusedHit};
pub use indexer::{BuildReport, IndexBuilder};
pub use lexical::LexicalIndex;
pub use retriever::{HybridRetriever, RetrievalOutcome};
pub use store::{
    content_hash, Chunk, IndexStats, JsonStore, RankedHit, RetrieverKind, ScoredChunk, VectorStore,
};
