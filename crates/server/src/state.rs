//! Shared application state

use std::sync::Arc;

use report_agent_agent::DialogueComposer;
use report_agent_config::{ReportCatalog, Settings};
use report_agent_core::{ApiKeyVerifier, ConversationStore};
use report_agent_retrieval::AbbreviationIndex;

/// Everything the handlers need, constructed once at the composition root
#[derive(Clone)]
pub struct AppState {
    pub composer: Arc<DialogueComposer>,
    pub store: Arc<dyn ConversationStore>,
    pub index: Arc<AbbreviationIndex>,
    pub catalog: Arc<ReportCatalog>,
    pub settings: Arc<Settings>,
    pub verifier: Arc<dyn ApiKeyVerifier>,
}
