//! Ollama chat backend

use std::time::Duration;

use async_trait::async_trait;
use jsonschema::JSONSchema;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use report_agent_core::LanguageModel;

use crate::prompt::Message;
use crate::LlmError;

/// Backend configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// API endpoint, e.g. `http://localhost:11434`
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Sampling temperature; extraction wants this low
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration, doubled each retry
    pub initial_backoff: Duration,
    /// Keep the model loaded between calls ("5m", "1h", "-1", "0")
    pub keep_alive: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen3:4b-instruct-2507-q4_K_M".to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            initial_backoff: Duration::from_millis(100),
            keep_alive: "5m".to_string(),
        }
    }
}

impl From<&report_agent_config::LlmConfig> for OllamaConfig {
    fn from(config: &report_agent_config::LlmConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<Value>,
    options: ChatOptions,
    keep_alive: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Ollama chat client
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint, path)
    }

    /// Send one chat request, optionally schema-constrained, with retries
    /// on transient failures.
    pub async fn chat(
        &self,
        messages: &[Message],
        format: Option<&Value>,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
            stream: false,
            format: format.cloned(),
            options: ChatOptions {
                temperature: self.config.temperature,
            },
            keep_alive: self.config.keep_alive.clone(),
        };

        let mut last_error = None;
        let mut backoff = self.config.initial_backoff;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    ?backoff,
                    attempt,
                    max = self.config.max_retries,
                    "LLM request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.execute(&request).await {
                Ok(response) => return Ok(response.message.content),
                Err(e) if Self::is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::Network("max retries exceeded".to_string())))
    }

    async fn execute(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.is_server_error() {
                return Err(LlmError::Network(format!("server error {status}: {body}")));
            }
            return Err(LlmError::Api(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))
    }

    fn is_retryable(error: &LlmError) -> bool {
        matches!(error, LlmError::Network(_) | LlmError::Timeout)
    }

    fn validate_against(schema: &Value, instance: &Value) -> Result<(), LlmError> {
        let compiled = JSONSchema::compile(schema)
            .map_err(|e| LlmError::Configuration(format!("bad schema: {e}")))?;
        if !compiled.is_valid(instance) {
            return Err(LlmError::InvalidResponse(format!(
                "payload does not match schema: {instance}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LanguageModel for OllamaBackend {
    async fn complete(&self, system: &str, user: &str) -> report_agent_core::Result<String> {
        let messages = [Message::system(system), Message::user(user)];
        Ok(self.chat(&messages, None).await?)
    }

    async fn complete_structured(
        &self,
        system: &str,
        user: &str,
        schema: &Value,
    ) -> report_agent_core::Result<Value> {
        let messages = [Message::system(system), Message::user(user)];
        let content = self.chat(&messages, Some(schema)).await?;

        let value: Value = serde_json::from_str(content.trim())
            .map_err(|e| LlmError::InvalidResponse(format!("unparseable JSON: {e}")))?;
        Self::validate_against(schema, &value)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.endpoint, "http://localhost:11434");
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn request_omits_format_when_absent() {
        let request = ChatRequest {
            model: "m".into(),
            messages: vec![Message::user("hi")],
            stream: false,
            format: None,
            options: ChatOptions { temperature: 0.1 },
            keep_alive: "5m".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("format").is_none());
    }

    #[test]
    fn schema_validation_rejects_mismatch() {
        let schema = json!({
            "type": "object",
            "properties": {"is_confirmed": {"type": "integer"}},
            "required": ["is_confirmed"]
        });
        assert!(OllamaBackend::validate_against(&schema, &json!({"is_confirmed": 1})).is_ok());
        assert!(OllamaBackend::validate_against(&schema, &json!({"other": 1})).is_err());
        assert!(
            OllamaBackend::validate_against(&schema, &json!({"is_confirmed": "yes"})).is_err()
        );
    }

    #[test]
    fn timeout_maps_to_retryable() {
        assert!(OllamaBackend::is_retryable(&LlmError::Timeout));
        assert!(OllamaBackend::is_retryable(&LlmError::Network("x".into())));
        assert!(!OllamaBackend::is_retryable(&LlmError::Api("x".into())));
    }
}
