//! Configuration system for graphloom.

use serde::{Deserialize, Serialize};

use crate::error::{LoomError, LoomResult};
use crate::traits::{GraphStoreConfig, LlmConfig};

/// Merge engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandConfig {
    /// Maximum number of chunk extractions in flight. `None` runs all at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_concurrency: Option<usize>,
}

/// Main graphloom configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoomConfig {
    /// Graph store configuration.
    pub graph_store: GraphStoreConfig,
    /// Sampling settings used for extraction.
    pub llm: LlmConfig,
    /// Merge engine configuration.
    pub expand: ExpandConfig,
}

impl LoomConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> LoomResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| LoomError::Configuration(e.to_string()))
            }
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| LoomError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| LoomError::Configuration(e.to_string()))
            }
            _ => Err(LoomError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables, reading `.env` first.
    pub fn from_env() -> LoomResult<Self> {
        // A missing .env file is fine.
        let _ = dotenvy::dotenv();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> LoomResult<Self> {
        let mut config = Self::default();

        // Graph store configuration
        if let Some(provider) = var("GRAPHLOOM_GRAPH_PROVIDER") {
            config.graph_store.provider = provider.parse()?;
        }
        if let Some(url) = var("GRAPHLOOM_GRAPH_URL") {
            config.graph_store.url = url;
        }
        if let Some(username) = var("GRAPHLOOM_GRAPH_USERNAME") {
            config.graph_store.username = Some(username);
        }
        if let Some(password) = var("GRAPHLOOM_GRAPH_PASSWORD") {
            config.graph_store.password = Some(password);
        }
        if let Some(database) = var("GRAPHLOOM_GRAPH_DATABASE") {
            config.graph_store.database = Some(database);
        }

        // LLM configuration
        if let Some(temperature) = var("GRAPHLOOM_LLM_TEMPERATURE") {
            config.llm.temperature = temperature.trim().parse().map_err(|_| {
                LoomError::Configuration(format!(
                    "GRAPHLOOM_LLM_TEMPERATURE must be a number, got '{}'",
                    temperature
                ))
            })?;
        }
        if let Some(max_tokens) = var("GRAPHLOOM_LLM_MAX_TOKENS") {
            config.llm.max_tokens = max_tokens.trim().parse().map_err(|_| {
                LoomError::Configuration(format!(
                    "GRAPHLOOM_LLM_MAX_TOKENS must be a positive integer, got '{}'",
                    max_tokens
                ))
            })?;
        }

        // Merge engine
        if let Some(limit) = var("GRAPHLOOM_EXTRACTION_CONCURRENCY") {
            let limit: usize = limit.trim().parse().map_err(|_| {
                LoomError::Configuration(format!(
                    "GRAPHLOOM_EXTRACTION_CONCURRENCY must be a positive integer, got '{}'",
                    limit
                ))
            })?;
            config.expand.extraction_concurrency = (limit > 0).then_some(limit);
        }

        Ok(config)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> LoomConfigBuilder {
        LoomConfigBuilder::default()
    }
}

/// Builder for LoomConfig.
#[derive(Default)]
pub struct LoomConfigBuilder {
    config: LoomConfig,
}

impl LoomConfigBuilder {
    /// Set graph store configuration.
    pub fn graph_store(mut self, config: GraphStoreConfig) -> Self {
        self.config.graph_store = config;
        self
    }

    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Bound the number of concurrent chunk extractions.
    pub fn extraction_concurrency(mut self, limit: usize) -> Self {
        self.config.expand.extraction_concurrency = Some(limit);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> LoomConfig {
        self.config
    }
}
