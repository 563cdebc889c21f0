//! Model gateway
//!
//! One narrow operation: prompt plus schema in, validated typed object or
//! `ExtractionFailure` out. Providers sit behind the `ModelClient` trait:
//! - OpenAI-compatible chat completions (OpenAI, OpenRouter)
//! - Scripted mock for tests
//!
//! The gateway never retries and never repairs output. A response that does
//! not parse or does not match the schema is a failure.

mod mock;
mod openai;

pub use mock::{MockModelClient, MockReply};
pub use openai::OpenAiCompatibleClient;

use crate::config::ModelConfig;
use crate::errors::{ExtractionFailure, ProviderError};
use crate::metrics;
use crate::schema::{OutputSchema, StructuredOutput};
use async_trait::async_trait;
use regex_lite::Regex;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Raw completion transport
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Run one zero-temperature, schema-constrained completion and return
    /// the raw text body
    async fn complete(&self, prompt: &str, schema: &OutputSchema) -> Result<String, ProviderError>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Per-run gateway around a model client.
///
/// Cheap to clone; clones share the client and the cancellation token.
#[derive(Clone)]
pub struct ModelGateway {
    client: Arc<dyn ModelClient>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl ModelGateway {
    pub fn new(client: Arc<dyn ModelClient>, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight and future calls when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Extract a `T` from the model's answer to `prompt`
    pub async fn extract<T: StructuredOutput>(&self, prompt: &str) -> Result<T, ExtractionFailure> {
        if self.cancel.is_cancelled() {
            return Err(ExtractionFailure::Cancelled);
        }

        let schema = T::output_schema();
        let start = Instant::now();

        let raw = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ExtractionFailure::Cancelled),
            outcome = tokio::time::timeout(self.timeout, self.client.complete(prompt, &schema)) => {
                match outcome {
                    Err(_) => Err(ExtractionFailure::Timeout {
                        timeout_ms: self.timeout.as_millis() as u64,
                    }),
                    Ok(result) => result.map_err(ExtractionFailure::from),
                }
            }
        };

        let result = raw.and_then(|body| parse_structured::<T>(&body));
        metrics::record_model_call(
            start.elapsed().as_secs_f64(),
            schema.name,
            result.as_ref().err().map(|e| e.code()),
        );

        if let Err(e) = &result {
            tracing::debug!(schema = schema.name, error = %e, "Model extraction failed");
        }

        result
    }
}

fn code_fence() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*?)\n?```$").expect("code fence pattern is valid")
    })
}

/// Parse and validate a raw model body against `T`.
///
/// A single enclosing markdown fence is transport framing and is removed;
/// nothing inside the body is altered.
pub fn parse_structured<T: StructuredOutput>(raw: &str) -> Result<T, ExtractionFailure> {
    let trimmed = raw.trim();
    let body = code_fence()
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ExtractionFailure::MalformedOutput {
            message: e.to_string(),
        })?;

    serde_json::from_value(value).map_err(|e| ExtractionFailure::SchemaViolation {
        schema: T::SCHEMA_NAME,
        message: e.to_string(),
    })
}

/// Create a model client based on configuration
pub fn create_model_client(config: &ModelConfig) -> Result<Arc<dyn ModelClient>, ProviderError> {
    match config.provider.as_str() {
        "openai" | "openrouter" => {
            let api_key = config.api_key.clone().ok_or_else(|| ProviderError::Other {
                message: format!("API key required for provider {}", config.provider),
            })?;
            Ok(Arc::new(OpenAiCompatibleClient::new(
                api_key,
                config.model.clone(),
                config.api_base.clone(),
                config.max_output_tokens,
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        other => Err(ProviderError::Other {
            message: format!("Unknown model provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{IntentDraft, OrderBatch};
    use tokio_test::{assert_err, assert_ok};

    fn gateway(client: MockModelClient, timeout_ms: u64) -> ModelGateway {
        ModelGateway::new(Arc::new(client), Duration::from_millis(timeout_ms))
    }

    #[test]
    fn test_fenced_body_is_unwrapped() {
        let raw = "```json\n{\"orders\": []}\n```";
        let batch: OrderBatch = assert_ok!(parse_structured(raw));
        assert!(batch.orders.is_empty());
    }

    #[test]
    fn test_prose_is_malformed() {
        let result = parse_structured::<OrderBatch>("Sure! Here are the orders: []");
        assert!(matches!(result, Err(ExtractionFailure::MalformedOutput { .. })));
    }

    #[test]
    fn test_wrong_shape_is_schema_violation() {
        let result = parse_structured::<OrderBatch>(r#"{"records": []}"#);
        assert!(matches!(
            result,
            Err(ExtractionFailure::SchemaViolation { schema: "extracted_orders", .. })
        ));
    }

    #[tokio::test]
    async fn test_extract_returns_typed_object() {
        let client = MockModelClient::new().respond_when(
            "Ohio",
            r#"{"locationFilter":"Ohio","minTotal":null,"maxTotal":null,"comparisonOperators":null}"#,
        );
        let draft: IntentDraft = assert_ok!(gateway(client, 1_000).extract("orders in Ohio").await);
        assert_eq!(draft.location_filter.as_deref(), Some("Ohio"));
    }

    #[tokio::test]
    async fn test_provider_error_is_failure() {
        let client = MockModelClient::new();
        let result = gateway(client, 1_000).extract::<OrderBatch>("anything").await;
        assert!(matches!(result, Err(ExtractionFailure::Provider(ProviderError::Unscripted))));
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported_per_prompt() {
        let client = MockModelClient::new()
            .fail_when("chunk 2", "upstream 502")
            .respond_when("chunk", r#"{"orders": []}"#);
        let gateway = gateway(client, 1_000);

        assert_ok!(gateway.extract::<OrderBatch>("chunk 1").await);
        let failure = assert_err!(gateway.extract::<OrderBatch>("chunk 2").await);
        assert_eq!(failure.code(), crate::errors::ErrorCode::ProviderError);
        assert!(failure.to_string().contains("upstream 502"));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let client = MockModelClient::new().reply_when("slow", MockReply::Hang);
        let result = gateway(client, 20).extract::<OrderBatch>("slow chunk").await;
        assert!(matches!(result, Err(ExtractionFailure::Timeout { timeout_ms: 20 })));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_call() {
        let client = MockModelClient::new().reply_when("slow", MockReply::Hang);
        let token = CancellationToken::new();
        let gateway = gateway(client, 60_000).with_cancellation(token.clone());

        let call = tokio::spawn(async move { gateway.extract::<OrderBatch>("slow chunk").await });
        token.cancel();

        let result = call.await.unwrap();
        assert!(matches!(assert_err!(result), ExtractionFailure::Cancelled));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = ModelConfig {
            provider: "carrier-pigeon".into(),
            ..ModelConfig::default()
        };
        assert!(create_model_client(&config).is_err());
    }
}
