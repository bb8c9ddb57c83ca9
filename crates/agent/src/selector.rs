//! Report selection

use std::sync::Arc;

use serde_json::Value;

use report_agent_config::ReportCatalog;
use report_agent_core::{LanguageModel, ReportId};

use crate::prompts::SelectorPrompt;

/// Maps free text to a report id, or `None` when unresolved.
///
/// Pure function of the message text: conversation context (falling back to
/// the prior report) is the composer's business. The prompt carries the
/// catalog's description and abbreviation glossary; the schema constrains
/// the answer to the closed endpoint set plus the `N/A` sentinel.
pub struct ReportSelector {
    llm: Arc<dyn LanguageModel>,
    catalog: Arc<ReportCatalog>,
}

impl ReportSelector {
    pub fn new(llm: Arc<dyn LanguageModel>, catalog: Arc<ReportCatalog>) -> Self {
        Self { llm, catalog }
    }

    fn descriptions(&self) -> String {
        self.catalog
            .reports
            .iter()
            .map(|r| format!("  - {}: {}", r.id.endpoint(), r.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn abbreviations(&self) -> String {
        self.catalog
            .reports
            .iter()
            .map(|r| format!("  - {}: {}", r.id.endpoint(), r.aliases.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn select(&self, message: &str) -> Option<ReportId> {
        let endpoints: Vec<&str> = self
            .catalog
            .reports
            .iter()
            .map(|r| r.id.endpoint())
            .collect();
        let schema = SelectorPrompt::schema(&endpoints);
        let user_prompt =
            SelectorPrompt::render(message, &self.descriptions(), &self.abbreviations());

        match self
            .llm
            .complete_structured(SelectorPrompt::SYSTEM, &user_prompt, &schema)
            .await
        {
            Ok(value) => value
                .get("function_called")
                .and_then(Value::as_str)
                .and_then(ReportId::from_endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "report selection degraded to unresolved");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedModel(Option<Value>);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _s: &str, _u: &str) -> report_agent_core::Result<String> {
            Ok(String::new())
        }

        async fn complete_structured(
            &self,
            _s: &str,
            _u: &str,
            _schema: &Value,
        ) -> report_agent_core::Result<Value> {
            self.0
                .clone()
                .ok_or_else(|| report_agent_core::Error::Llm("down".to_string()))
        }
    }

    fn selector(answer: Option<Value>) -> ReportSelector {
        ReportSelector::new(
            Arc::new(FixedModel(answer)),
            Arc::new(ReportCatalog::embedded().unwrap()),
        )
    }

    #[tokio::test]
    async fn resolves_endpoint() {
        let selector = selector(Some(json!({"function_called": "/turnover"})));
        assert_eq!(selector.select("to report").await, Some(ReportId::Turnover));
    }

    #[tokio::test]
    async fn sentinel_is_unresolved() {
        let selector = selector(Some(json!({"function_called": "N/A"})));
        assert_eq!(selector.select("hello").await, None);
    }

    #[tokio::test]
    async fn failure_is_unresolved() {
        let selector = selector(None);
        assert_eq!(selector.select("wl").await, None);
    }
}
