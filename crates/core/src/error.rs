//! Error taxonomy shared across the workspace
//!
//! Each crate keeps its own `thiserror` enum and converts into this one at
//! the crate boundary, so callers only ever match on a single type.

use thiserror::Error;

/// Workspace-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("llm error: {0}")]
    Llm(String),

    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
