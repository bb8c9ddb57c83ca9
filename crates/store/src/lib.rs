//! Conversation persistence
//!
//! Two [`report_agent_core::ConversationStore`] implementations:
//! - [`FileStore`]: one JSON document keyed by user id, matching the
//!   deployment's file-backed history.
//! - [`MemoryStore`]: dashmap-backed, for tests and ephemeral setups.
//!
//! Mutation methods report failure as `false` rather than erroring — a
//! failed persist is a server-side durability event, never a request
//! failure. Plus the tracing-backed [`AnalyticsSink`] implementation.

pub mod analytics;
pub mod file;
pub mod memory;

pub use analytics::TracingAnalytics;
pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Store errors (internal; the trait surface degrades to booleans)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for report_agent_core::Error {
    fn from(err: StoreError) -> Self {
        report_agent_core::Error::Store(err.to_string())
    }
}
