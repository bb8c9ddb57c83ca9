//! Abbreviation index
//!
//! One retrieval collection for report-name aliases plus one per report for
//! entity-value aliases, each backed by a dense and a sparse index built
//! from the report catalog. Indexing is an offline/on-demand operation;
//! `hybrid_search` is the only request-time path.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;

use report_agent_config::{ReportCatalog, ReportSpec, RetrievalConfig};
use report_agent_core::{Field, ReportId};

use crate::dense::DenseIndex;
use crate::embed::Embedder;
use crate::fusion::weighted_vote;
use crate::rerank::Reranker;
use crate::sparse::SparseIndex;
use crate::RetrievalError;

const REPORTS_COLLECTION: &str = "reports";

fn entity_collection(report: ReportId) -> String {
    format!("entities{}", report.endpoint())
}

/// One indexed alias string and what it resolves to
#[derive(Debug, Clone, Serialize)]
pub struct AliasEntry {
    pub report: ReportId,
    /// `None` for report-name aliases
    pub field: Option<Field>,
    /// The canonical value the alias expands to
    pub canonical: String,
    /// The indexed alias text
    pub alias: String,
}

/// Fusion and depth configuration
#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub semantic_weight: f32,
    pub keyword_weight: f32,
    /// Results returned after reranking
    pub top_k: usize,
    /// Candidates fetched from each retrieval before fusion
    pub fetch_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.9,
            keyword_weight: 0.1,
            top_k: 10,
            fetch_k: 10,
        }
    }
}

impl From<&RetrievalConfig> for IndexConfig {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            semantic_weight: config.semantic_weight,
            keyword_weight: config.keyword_weight,
            top_k: config.top_k,
            fetch_k: config.fetch_k,
        }
    }
}

struct Collection {
    entries: Vec<AliasEntry>,
    dense: DenseIndex,
    sparse: SparseIndex,
}

type CollectionMap = BTreeMap<String, Arc<Collection>>;

/// Hybrid retrieval over alias collections.
///
/// Readers clone the current collection map `Arc` and never block a
/// rebuild; a rebuild assembles new collections and swaps the map pointer
/// under a short write lock.
pub struct AbbreviationIndex {
    config: IndexConfig,
    embedder: Arc<dyn Embedder>,
    reranker: Arc<dyn Reranker>,
    collections: RwLock<Arc<CollectionMap>>,
}

impl AbbreviationIndex {
    pub fn new(
        config: IndexConfig,
        embedder: Arc<dyn Embedder>,
        reranker: Arc<dyn Reranker>,
    ) -> Self {
        Self {
            config,
            embedder,
            reranker,
            collections: RwLock::new(Arc::new(CollectionMap::new())),
        }
    }

    fn report_entries(catalog: &ReportCatalog) -> Vec<AliasEntry> {
        let mut entries = Vec::new();
        for report in &catalog.reports {
            entries.push(AliasEntry {
                report: report.id,
                field: None,
                canonical: report.id.display_name().to_string(),
                alias: report.id.display_name().to_string(),
            });
            for alias in &report.aliases {
                entries.push(AliasEntry {
                    report: report.id,
                    field: None,
                    canonical: report.id.display_name().to_string(),
                    alias: alias.clone(),
                });
            }
        }
        entries
    }

    fn entity_entries(spec: &ReportSpec) -> Vec<AliasEntry> {
        let mut entries = Vec::new();
        for field in &spec.fields {
            for (canonical, aliases) in &field.aliases {
                entries.push(AliasEntry {
                    report: spec.id,
                    field: Some(field.field),
                    canonical: canonical.clone(),
                    alias: canonical.clone(),
                });
                for alias in aliases {
                    entries.push(AliasEntry {
                        report: spec.id,
                        field: Some(field.field),
                        canonical: canonical.clone(),
                        alias: alias.clone(),
                    });
                }
            }
        }
        entries
    }

    async fn build_collection(
        &self,
        entries: Vec<AliasEntry>,
    ) -> Result<Collection, RetrievalError> {
        let texts: Vec<String> = entries.iter().map(|e| e.alias.clone()).collect();

        let mut vectors = Vec::with_capacity(texts.len());
        for text in &texts {
            vectors.push(self.embedder.embed(text).await?);
        }
        let dense = DenseIndex::build(vectors);

        let sparse = tokio::task::spawn_blocking(move || SparseIndex::build(&texts))
            .await
            .map_err(|e| RetrievalError::Index(format!("index build task failed: {e}")))??;

        Ok(Collection {
            entries,
            dense,
            sparse,
        })
    }

    fn swap(&self, replacements: Vec<(String, Collection)>, clear_entities: bool) {
        let mut guard = self.collections.write();
        let mut map = (**guard).clone();
        if clear_entities {
            map.retain(|name, _| !name.starts_with("entities"));
        }
        for (name, collection) in replacements {
            map.insert(name, Arc::new(collection));
        }
        *guard = Arc::new(map);
    }

    /// Rebuild the report-name collection. Idempotent: the previous
    /// artifact for the collection is fully replaced.
    pub async fn rebuild_reports(&self, catalog: &ReportCatalog) -> Result<(), RetrievalError> {
        let collection = self
            .build_collection(Self::report_entries(catalog))
            .await?;
        let count = collection.entries.len();
        self.swap(vec![(REPORTS_COLLECTION.to_string(), collection)], false);
        tracing::info!(count, "report alias collection rebuilt");
        Ok(())
    }

    /// Rebuild every entity-alias collection. Idempotent: all previous
    /// entity collections are replaced in one swap.
    pub async fn rebuild_entities(&self, catalog: &ReportCatalog) -> Result<(), RetrievalError> {
        let mut replacements = Vec::new();
        for spec in &catalog.reports {
            let entries = Self::entity_entries(spec);
            if entries.is_empty() {
                continue;
            }
            let collection = self.build_collection(entries).await?;
            replacements.push((entity_collection(spec.id), collection));
        }
        let collections = replacements.len();
        self.swap(replacements, true);
        tracing::info!(collections, "entity alias collections rebuilt");
        Ok(())
    }

    pub async fn rebuild_all(&self, catalog: &ReportCatalog) -> Result<(), RetrievalError> {
        let (reports, entities) =
            tokio::join!(self.rebuild_reports(catalog), self.rebuild_entities(catalog));
        reports?;
        entities
    }

    /// Search the report-name collection
    pub async fn search_reports(&self, query: &str) -> Result<Vec<AliasEntry>, RetrievalError> {
        self.hybrid_search(REPORTS_COLLECTION, query).await
    }

    /// Search one report's entity-alias collection
    pub async fn search_entities(
        &self,
        report: ReportId,
        query: &str,
    ) -> Result<Vec<AliasEntry>, RetrievalError> {
        self.hybrid_search(&entity_collection(report), query).await
    }

    /// Dual retrieval, weighted-confidence fusion, then reranking of the
    /// fused top-k only.
    async fn hybrid_search(
        &self,
        name: &str,
        query: &str,
    ) -> Result<Vec<AliasEntry>, RetrievalError> {
        let collection = self
            .collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RetrievalError::NotFound(name.to_string()))?;

        let fetch_k = self.config.fetch_k;
        let sparse_collection = Arc::clone(&collection);
        let sparse_query = query.to_string();
        let sparse_task = tokio::task::spawn_blocking(move || {
            sparse_collection.sparse.search(&sparse_query, fetch_k)
        });

        let (embedding, sparse_joined) = tokio::join!(self.embedder.embed(query), sparse_task);

        let dense_list = collection.dense.search(&embedding?, fetch_k);
        let sparse_list = sparse_joined
            .map_err(|e| RetrievalError::Search(format!("sparse search task failed: {e}")))??;

        let fused = weighted_vote(
            &[dense_list, sparse_list],
            &[self.config.semantic_weight, self.config.keyword_weight],
        );
        let candidates: Vec<usize> = fused.into_iter().take(self.config.top_k).collect();

        let scores = join_all(
            candidates
                .iter()
                .map(|&i| self.reranker.score(query, &collection.entries[i].alias)),
        )
        .await;

        let mut ranked: Vec<(usize, usize, f32)> = Vec::with_capacity(candidates.len());
        for (fused_rank, (position, score)) in candidates.iter().zip(scores).enumerate() {
            ranked.push((fused_rank, *position, score?));
        }
        ranked.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        Ok(ranked
            .into_iter()
            .take(self.config.top_k)
            .map(|(_, position, _)| collection.entries[position].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;
    use crate::rerank::LexicalScorer;

    fn index() -> AbbreviationIndex {
        AbbreviationIndex::new(
            IndexConfig::default(),
            Arc::new(HashEmbedder::default()),
            Arc::new(LexicalScorer),
        )
    }

    #[tokio::test]
    async fn search_before_rebuild_is_not_found() {
        let index = index();
        let err = index.search_reports("wl").await.unwrap_err();
        assert!(matches!(err, RetrievalError::NotFound(_)));
    }

    #[tokio::test]
    async fn report_alias_resolves_after_rebuild() {
        let catalog = ReportCatalog::embedded().unwrap();
        let index = index();
        index.rebuild_all(&catalog).await.unwrap();

        let results = index.search_reports("wl report please").await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].report, ReportId::WinlostDetail);
    }

    #[tokio::test]
    async fn entity_alias_resolves_to_canonical_value() {
        let catalog = ReportCatalog::embedded().unwrap();
        let index = index();
        index.rebuild_entities(&catalog).await.unwrap();

        let results = index
            .search_entities(ReportId::WinlostDetail, "sb only for me")
            .await
            .unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].canonical, "Sportsbook");
        assert_eq!(results[0].field, Some(Field::Product));
    }

    #[tokio::test]
    async fn repeated_searches_are_identical() {
        let catalog = ReportCatalog::embedded().unwrap();
        let index = index();
        index.rebuild_reports(&catalog).await.unwrap();

        let first: Vec<String> = index
            .search_reports("turnover")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.alias)
            .collect();
        let second: Vec<String> = index
            .search_reports("turnover")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.alias)
            .collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn rebuild_is_idempotent() {
        let catalog = ReportCatalog::embedded().unwrap();
        let index = index();
        index.rebuild_reports(&catalog).await.unwrap();
        let before = index.search_reports("wl").await.unwrap().len();
        index.rebuild_reports(&catalog).await.unwrap();
        let after = index.search_reports("wl").await.unwrap().len();
        assert_eq!(before, after);
    }
}
