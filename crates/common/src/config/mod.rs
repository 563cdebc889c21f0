//! Configuration management for the order agent
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with ORDER_AGENT__)
//! - The OPENROUTER_* variables for the model section
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Orders API (raw text source)
    #[serde(default)]
    pub orders_api: OrdersApiConfig,

    /// Model provider configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Chunking and extraction configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrdersApiConfig {
    /// URL returning the raw order text
    #[serde(default = "default_orders_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_orders_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Provider: openai, openrouter
    #[serde(default = "default_model_provider")]
    pub provider: String,

    /// API key for the provider
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,

    /// Maximum tokens in one completion
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

/// Unit of the chunk budget
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BudgetUnit {
    Characters,
    Tokens,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractionConfig {
    /// Maximum chunk size, in `budget_unit`
    #[serde(default = "default_chunk_budget")]
    pub chunk_budget: usize,

    /// Whether the budget counts characters or tokens
    #[serde(default = "default_budget_unit")]
    pub budget_unit: BudgetUnit,

    /// Maximum concurrent chunk extractions
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_orders_url() -> String { "http://localhost:5001/api/orders".to_string() }
fn default_orders_timeout() -> u64 { 5 }
fn default_model_provider() -> String { "openrouter".to_string() }
fn default_model() -> String { crate::DEFAULT_MODEL.to_string() }
fn default_model_timeout() -> u64 { 60 }
fn default_max_output_tokens() -> u32 { 4096 }
fn default_chunk_budget() -> usize { crate::DEFAULT_CHUNK_BUDGET }
fn default_budget_unit() -> BudgetUnit { BudgetUnit::Characters }
fn default_max_concurrency() -> usize { 4 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { false }
fn default_service_name() -> String { "order-agent".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., ORDER_AGENT__EXTRACTION__CHUNK_BUDGET=2000
            .add_source(
                Environment::with_prefix("ORDER_AGENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::with_provider_env(builder)?.build()?.try_deserialize()
    }

    /// Load from a specific file, still honoring environment overrides
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("ORDER_AGENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::with_provider_env(builder)?.build()?.try_deserialize()
    }

    /// OPENROUTER_API_KEY, OPENROUTER_API_BASE and OPENROUTER_MODEL win over files
    fn with_provider_env(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_override_option("model.api_key", std::env::var("OPENROUTER_API_KEY").ok())?
            .set_override_option("model.api_base", std::env::var("OPENROUTER_API_BASE").ok())?
            .set_override_option("model.model", std::env::var("OPENROUTER_MODEL").ok())
    }

    /// Per-call model timeout as Duration
    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_secs)
    }

    /// Orders API timeout as Duration
    pub fn orders_timeout(&self) -> Duration {
        Duration::from_secs(self.orders_api.timeout_secs)
    }
}

impl Default for OrdersApiConfig {
    fn default() -> Self {
        Self {
            url: default_orders_url(),
            timeout_secs: default_orders_timeout(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_model_provider(),
            api_key: None,
            api_base: None,
            model: default_model(),
            timeout_secs: default_model_timeout(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_budget: default_chunk_budget(),
            budget_unit: default_budget_unit(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}
