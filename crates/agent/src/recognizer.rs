//! Binary decision agents

use std::sync::Arc;

use serde_json::Value;

use report_agent_core::LanguageModel;

use crate::prompts::RecognizerPrompt;

/// A yes/no decision over the raw user message.
///
/// The model answers `{key: 0|1}` under a strict schema; an absent key, a
/// malformed payload or a backend failure all resolve to `false`, the safe
/// default for both the casual check and the confirmation check.
pub struct Recognizer {
    llm: Arc<dyn LanguageModel>,
    prompt: RecognizerPrompt,
}

impl Recognizer {
    pub fn casual(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            prompt: RecognizerPrompt::casual(),
        }
    }

    pub fn confirmation(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            prompt: RecognizerPrompt::confirmation(),
        }
    }

    pub async fn decide(&self, message: &str) -> bool {
        let schema = self.prompt.schema();
        let user_prompt = self.prompt.render(message);

        match self
            .llm
            .complete_structured(self.prompt.system, &user_prompt, &schema)
            .await
        {
            Ok(value) => value
                .get(self.prompt.answer_key)
                .and_then(Value::as_i64)
                .map(|v| v == 1)
                .unwrap_or(false),
            Err(e) => {
                tracing::warn!(
                    agent = self.prompt.name,
                    error = %e,
                    "decision degraded to safe default"
                );
                false
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

    #[tokio::test]
    async fn positive_decision() {
        let recognizer =
            Recognizer::confirmation(Arc::new(FixedModel(Some(json!({"is_confirmed": 1})))));
        assert!(recognizer.decide("yes confirm").await);
    }

    #[tokio::test]
    async fn missing_key_defaults_to_false() {
        let recognizer = Recognizer::confirmation(Arc::new(FixedModel(Some(json!({})))));
        assert!(!recognizer.decide("yes confirm").await);
    }

    #[tokio::test]
    async fn backend_failure_defaults_to_false() {
        let recognizer = Recognizer::casual(Arc::new(FixedModel(None)));
        assert!(!recognizer.decide("hello").await);
    }
}
