//! Language-model client
//!
//! One backend: an Ollama-compatible chat endpoint reached over HTTP. Two
//! call shapes:
//! - plain completion (casual replies)
//! - structured completion: the request carries a JSON schema in `format`,
//!   and the returned content is parsed and validated against that schema
//!   before it reaches any caller.
//!
//! Transient network failures retry with exponential backoff; a malformed
//! or non-conforming payload is a hard error so callers can fall back to
//! their safe defaults instead of consuming silently-wrong JSON.

pub mod backend;
pub mod prompt;

pub use backend::{OllamaBackend, OllamaConfig};
pub use prompt::{Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("api error: {0}")]
    Api(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("timeout")]
    Timeout,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for report_agent_core::Error {
    fn from(err: LlmError) -> Self {
        report_agent_core::Error::Llm(err.to_string())
    }
}
