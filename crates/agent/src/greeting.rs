//! Casual-conversation replies

use std::sync::Arc;

use report_agent_core::LanguageModel;

use crate::prompts::GreetingPrompt;

const FALLBACK_GREETING: &str = "👋 Hello! I'm the report assistant. Ask me for a win/loss, \
                                 turnover or outstanding report whenever you're ready. 😊";

/// Generates the small-talk reply on the casual path.
///
/// The only unconstrained completion in the system; when it fails the user
/// still gets the scripted greeting rather than an error body.
pub struct Greeter {
    llm: Arc<dyn LanguageModel>,
}

impl Greeter {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn chat(&self, message: &str) -> String {
        match self
            .llm
            .complete(GreetingPrompt::SYSTEM, &GreetingPrompt::render(message))
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => FALLBACK_GREETING.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "greeting degraded to scripted reply");
                FALLBACK_GREETING.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;

    struct FixedModel(Option<String>);

    #[async_trait]
    impl LanguageModel for FixedModel {
        async fn complete(&self, _s: &str, _u: &str) -> report_agent_core::Result<String> {
            self.0
                .clone()
                .ok_or_else(|| report_agent_core::Error::Llm("down".to_string()))
        }

        async fn complete_structured(
            &self,
            _s: &str,
            _u: &str,
            _schema: &Value,
        ) -> report_agent_core::Result<Value> {
            Err(report_agent_core::Error::Llm("unused".to_string()))
        }
    }

    #[tokio::test]
    async fn passes_model_reply_through() {
        let greeter = Greeter::new(Arc::new(FixedModel(Some("👋 Hi Leon!".to_string()))));
        assert_eq!(greeter.chat("hi").await, "👋 Hi Leon!");
    }

    #[tokio::test]
    async fn falls_back_when_model_is_down() {
        let greeter = Greeter::new(Arc::new(FixedModel(None)));
        assert_eq!(greeter.chat("hi").await, FALLBACK_GREETING);
    }

    #[tokio::test]
    async fn falls_back_on_empty_reply() {
        let greeter = Greeter::new(Arc::new(FixedModel(Some("  ".to_string()))));
        assert_eq!(greeter.chat("hi").await, FALLBACK_GREETING);
    }
}
