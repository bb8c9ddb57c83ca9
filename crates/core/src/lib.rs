//! Core types and traits for the report agent
//!
//! This crate provides the foundational pieces shared by every other crate:
//! - The closed report/field vocabulary and typed parameter records
//! - Conversation turns and the caller-visible reply
//! - Status codes attached to every composed reply
//! - Collaborator traits (language model, conversation store, analytics,
//!   API-key verification) implemented elsewhere and injected at the
//!   composition root
//! - Bounded fan-out and per-user serialization primitives

pub mod error;
pub mod report;
pub mod status;
pub mod sync;
pub mod traits;
pub mod turn;

pub use error::{Error, Result};
pub use report::{
    EntityMap, Field, FieldValue, OutstandingParams, ReportId, ReportParams,
    TopOutstandingParams, WinlostTurnoverParams, ALL, DEFAULT_TOP, UNSPECIFIED,
};
pub use status::Status;
pub use sync::{UserLocks, WorkerPool};
pub use traits::{AnalyticsEvent, AnalyticsSink, ApiKeyVerifier, ConversationStore, LanguageModel};
pub use turn::{Reply, Turn};
