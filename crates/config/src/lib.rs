//! Configuration for the report agent
//!
//! Two halves:
//! - [`Settings`]: layered runtime settings (files + `REPORT_AGENT__`
//!   environment overrides) for the server, the model backend, retrieval
//!   and conversation retention.
//! - [`ReportCatalog`]: the static description of every report — field
//!   specs with defaults, closed enumerations and alias lists — loaded from
//!   YAML. The catalog drives extraction schemas, validation, response
//!   rendering and abbreviation indexing.

pub mod catalog;
pub mod settings;

pub use catalog::{FieldSpec, ReportCatalog, ReportSpec};
pub use settings::{
    load_settings, AuthConfig, ConversationConfig, EmbeddingConfig, EmbeddingMode, LlmConfig,
    RetrievalConfig, RuntimeEnvironment, ServerConfig, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("catalog error: {0}")]
    Catalog(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for report_agent_core::Error {
    fn from(err: ConfigError) -> Self {
        report_agent_core::Error::Config(err.to_string())
    }
}
