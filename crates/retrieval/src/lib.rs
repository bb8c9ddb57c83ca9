//! Hybrid abbreviation retrieval
//!
//! Two parallel indexes per searchable collection — a dense embedding index
//! and a lexical BM25 index — fused by a weighted-confidence vote and
//! passed through a cross-encoder-style reranker. Fusion is cheap and
//! recall-oriented; reranking is precise and only ever runs over the fused
//! top-k, never the whole corpus.
//!
//! Collections are read-heavy and write-rare: a rebuild assembles complete
//! new artifacts off to the side and swaps them in atomically, so readers
//! never observe a half-written index.

pub mod dense;
pub mod embed;
pub mod fusion;
pub mod index;
pub mod rerank;
pub mod sparse;

pub use dense::DenseIndex;
pub use embed::{Embedder, HashEmbedder, OllamaEmbedder};
pub use fusion::weighted_vote;
pub use index::{AbbreviationIndex, AliasEntry, IndexConfig};
pub use rerank::{LexicalScorer, Reranker};
pub use sparse::SparseIndex;

use thiserror::Error;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("index error: {0}")]
    Index(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("collection not found: {0}")]
    NotFound(String),
}

impl From<RetrievalError> for report_agent_core::Error {
    fn from(err: RetrievalError) -> Self {
        report_agent_core::Error::Retrieval(err.to_string())
    }
}
