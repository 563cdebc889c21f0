//! Order Agent Common Library
//!
//! Shared code for the order agent crates including:
//! - Schema contracts for intents and order records
//! - The model gateway (schema-constrained extraction)
//! - The orders API fetch client
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod gateway;
pub mod metrics;
pub mod orders_api;
pub mod schema;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{ErrorCode, ExtractionFailure, FetchError, ValidationError};
pub use gateway::{ModelClient, ModelGateway};
pub use orders_api::OrdersSource;
pub use schema::{ComparisonOperator, Intent, IntentDraft, OrderRecord};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model used when none is configured
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default chunk budget in characters
pub const DEFAULT_CHUNK_BUDGET: usize = 1500;
