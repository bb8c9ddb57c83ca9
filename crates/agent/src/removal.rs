//! Removal-intent detection

use std::sync::Arc;

use serde_json::Value;

use report_agent_core::{Field, LanguageModel};

use crate::prompts::RemovalPrompt;

/// Detects which fields the user asked to remove or reset.
///
/// The output domain is constrained at call time: the schema enum is built
/// from the caller's current field set, never from a static list, so the
/// model can only name fields that actually exist in context. Failures
/// resolve to the empty set.
pub struct RemovalDetector {
    llm: Arc<dyn LanguageModel>,
}

impl RemovalDetector {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn detect(&self, message: &str, fields: &[Field]) -> Vec<Field> {
        if fields.is_empty() {
            return Vec::new();
        }

        let schema = RemovalPrompt::schema(fields);
        let names = fields
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ");
        let user_prompt = RemovalPrompt::render(message, &names);

        match self
            .llm
            .complete_structured(RemovalPrompt::SYSTEM, &user_prompt, &schema)
            .await
        {
            Ok(value) => value
                .get("params2delete")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .filter_map(Field::from_name)
                        .filter(|f| fields.contains(f))
                        .collect()
                })
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "removal detection degraded to empty set");
                Vec::new()
            }
        }
    }
}
