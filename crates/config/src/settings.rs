//! Runtime settings
//!
//! Loaded from `config/default.*` plus an optional environment-specific
//! file, with `REPORT_AGENT__`-prefixed environment variables layered on
//! top (`REPORT_AGENT__SERVER__PORT=9000` and the like).

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Worker slots for fan-out sub-tasks within one request
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Reporting timezone as a fixed offset from UTC, in hours
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset_hours: i32,

    /// Optional path to an external report catalog (YAML); the embedded
    /// catalog is used when unset
    #[serde(default)]
    pub report_catalog_path: Option<String>,
}

fn default_workers() -> usize {
    8
}

fn default_timezone_offset() -> i32 {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: RuntimeEnvironment::default(),
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            conversation: ConversationConfig::default(),
            workers: default_workers(),
            timezone_offset_hours: default_timezone_offset(),
            report_catalog_path: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            auth: AuthConfig::default(),
        }
    }
}

/// API-key authentication at the HTTP boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Accepted Bearer keys
    #[serde(default)]
    pub api_keys: Vec<String>,
    /// Path prefixes that bypass authentication
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,
}

fn default_public_paths() -> Vec<String> {
    vec!["/health".to_string()]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_keys: Vec::new(),
            public_paths: default_public_paths(),
        }
    }
}

/// Language-model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "qwen3:4b-instruct-2507-q4_K_M".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// How dense vectors are produced for the abbreviation index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Deterministic in-process hash projection (no model required)
    #[default]
    Hash,
    /// Remote embedding endpoint
    Ollama,
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub mode: EmbeddingMode,
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
}

fn default_embedding_model() -> String {
    "qwen3-embedding:0.6b".to_string()
}

fn default_embedding_dim() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Hash,
            endpoint: default_llm_endpoint(),
            model: default_embedding_model(),
            dim: default_embedding_dim(),
        }
    }
}

/// Hybrid retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Fusion weight of the dense retrieval
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,
    /// Fusion weight of the keyword retrieval
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,
    /// Results returned after reranking
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Candidates fetched from each retrieval before fusion
    #[serde(default = "default_fetch_k")]
    pub fetch_k: usize,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

fn default_semantic_weight() -> f32 {
    0.9
}

fn default_keyword_weight() -> f32 {
    0.1
}

fn default_top_k() -> usize {
    10
}

fn default_fetch_k() -> usize {
    10
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            top_k: default_top_k(),
            fetch_k: default_fetch_k(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Conversation persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// JSON document backing the per-user histories
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Histories idle for longer than this are evicted
    #[serde(default = "default_expired_hours")]
    pub expired_hours: i64,
    /// Background eviction cadence
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

fn default_store_path() -> String {
    "data/conversations.json".to_string()
}

fn default_expired_hours() -> i64 {
    24
}

fn default_eviction_interval() -> u64 {
    3600
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            expired_hours: default_expired_hours(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Validation("workers must be at least 1".into()));
        }
        let weight_sum = self.retrieval.semantic_weight + self.retrieval.keyword_weight;
        if !(0.99..=1.01).contains(&weight_sum) {
            return Err(ConfigError::Validation(format!(
                "retrieval weights must sum to 1.0, got {weight_sum}"
            )));
        }
        if self.retrieval.top_k == 0 || self.retrieval.fetch_k == 0 {
            return Err(ConfigError::Validation(
                "retrieval top_k and fetch_k must be positive".into(),
            ));
        }
        if !(-12..=14).contains(&self.timezone_offset_hours) {
            return Err(ConfigError::Validation(format!(
                "timezone offset out of range: {}",
                self.timezone_offset_hours
            )));
        }
        if self.environment.is_production() && self.server.auth.enabled
            && self.server.auth.api_keys.is_empty()
        {
            return Err(ConfigError::Validation(
                "auth enabled in production without any api keys".into(),
            ));
        }
        Ok(())
    }
}

/// Load settings from files and environment
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{env_name}")).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("REPORT_AGENT")
            .separator("__")
            .try_parsing(true),
    );

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
