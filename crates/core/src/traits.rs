//! Collaborator traits
//!
//! Every external capability the composer touches sits behind one of these
//! traits and is passed in at construction. Nothing is resolved through
//! ambient lookup, which keeps the composer testable with scripted fakes.

use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;

use crate::error::Result;
use crate::turn::Turn;

/// Black-box text generation.
///
/// `complete_structured` must return JSON matching the supplied schema; a
/// backend failure or a non-conforming payload surfaces as an error so the
/// caller can degrade to its safe default, never as silently-wrong JSON.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    async fn complete_structured(&self, system: &str, user: &str, schema: &Value)
        -> Result<Value>;
}

/// Per-user conversation history.
///
/// `insert` replaces the user's whole sequence (callers read-modify-write);
/// mutation failures are reported as `false` and must never panic, since a
/// failed persist still has to produce a valid reply. Concurrent
/// read-modify-write cycles for the same user are serialized by the caller
/// via [`crate::sync::UserLocks`].
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Vec<Turn>;

    async fn insert(&self, user_id: &str, turns: Vec<Turn>) -> bool;

    async fn delete(&self, user_id: &str) -> bool;

    /// Remove users whose last turn is older than `max_age`; returns how
    /// many users were evicted.
    async fn evict(&self, max_age: Duration) -> usize;
}

/// One audit record per non-casual compose
#[derive(Debug, Clone)]
pub struct AnalyticsEvent {
    pub question: String,
    pub entities: Option<String>,
    pub endpoint: Option<String>,
    pub latency_secs: f64,
}

/// Fire-and-forget audit sink; failures must never fail the request
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent);
}

/// Caller credential check performed at the HTTP boundary
#[async_trait]
pub trait ApiKeyVerifier: Send + Sync {
    async fn verify(&self, key: &str) -> bool;
}
