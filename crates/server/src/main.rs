//! Composition root
//!
//! Builds every collaborator explicitly — settings, catalog, model backend,
//! embedder, abbreviation index, store, composer — and injects them by
//! constructor. No ambient lookup anywhere.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use report_agent_agent::DialogueComposer;
use report_agent_config::{load_settings, EmbeddingMode, ReportCatalog};
use report_agent_core::{ConversationStore, WorkerPool};
use report_agent_llm::{OllamaBackend, OllamaConfig};
use report_agent_retrieval::{
    AbbreviationIndex, Embedder, HashEmbedder, IndexConfig, LexicalScorer, OllamaEmbedder,
};
use report_agent_server::{auth::verifier_from_settings, create_router, AppState};
use report_agent_store::{FileStore, TracingAnalytics};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app_mode = std::env::var("APP_MODE").ok();
    let settings = Arc::new(load_settings(app_mode.as_deref())?);
    tracing::info!(env = ?settings.environment, "settings loaded");

    let catalog = Arc::new(match &settings.report_catalog_path {
        Some(path) => ReportCatalog::from_path(path)?,
        None => ReportCatalog::embedded()?,
    });

    let llm = Arc::new(OllamaBackend::new(OllamaConfig::from(&settings.llm))?);

    let embedding = &settings.retrieval.embedding;
    let embedder: Arc<dyn Embedder> = match embedding.mode {
        EmbeddingMode::Hash => Arc::new(HashEmbedder::new(embedding.dim)),
        EmbeddingMode::Ollama => Arc::new(OllamaEmbedder::new(
            embedding.endpoint.clone(),
            embedding.model.clone(),
            embedding.dim,
        )),
    };

    let index = Arc::new(AbbreviationIndex::new(
        IndexConfig::from(&settings.retrieval),
        embedder,
        Arc::new(LexicalScorer),
    ));
    index.rebuild_all(&catalog).await?;

    let store: Arc<dyn ConversationStore> =
        Arc::new(FileStore::open(&settings.conversation.store_path).await?);

    let composer = Arc::new(DialogueComposer::with_default_agents(
        llm,
        catalog.clone(),
        store.clone(),
        Arc::new(TracingAnalytics::new()),
        WorkerPool::new(settings.workers),
        settings.timezone_offset_hours,
    ));

    spawn_eviction_task(
        store.clone(),
        settings.conversation.expired_hours,
        settings.conversation.eviction_interval_secs,
    );

    let state = AppState {
        composer,
        store,
        index,
        catalog,
        settings: settings.clone(),
        verifier: verifier_from_settings(&settings),
    };

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "report agent listening");

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

/// Periodically drop user histories idle past the configured TTL.
fn spawn_eviction_task(
    store: Arc<dyn ConversationStore>,
    expired_hours: i64,
    interval_secs: u64,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(60)));
        ticker.tick().await; // immediate first tick
        loop {
            ticker.tick().await;
            let evicted = store.evict(chrono::Duration::hours(expired_hours)).await;
            if evicted > 0 {
                tracing::info!(evicted, "stale conversations evicted");
            }
        }
    });
}
