//! Intent Extractor - turns a free-text query into a validated `Intent`

use crate::prompts;
use order_agent_common::errors::IntentExtractionError;
use order_agent_common::gateway::ModelGateway;
use order_agent_common::schema::{Intent, IntentDraft};
use tracing::{info, instrument, warn};

/// Single-call intent extraction. Failure is fatal for the request.
pub struct IntentExtractor {
    gateway: ModelGateway,
}

impl IntentExtractor {
    pub fn new(gateway: ModelGateway) -> Self {
        Self { gateway }
    }

    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn extract(&self, query: &str) -> Result<Intent, IntentExtractionError> {
        let draft: IntentDraft = self
            .gateway
            .extract(&prompts::intent_prompt(query))
            .await
            .inspect_err(|e| warn!(error = %e, "Intent extraction failed"))?;

        let intent = Intent::from_draft(draft, query)
            .inspect_err(|e| warn!(error = %e, "Intent rejected"))?;

        info!(
            location = ?intent.location_filter(),
            min_total = ?intent.min_total(),
            max_total = ?intent.max_total(),
            "Intent extracted"
        );

        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_agent_common::errors::{ExtractionFailure, IntentError};
    use order_agent_common::gateway::MockModelClient;
    use order_agent_common::schema::ComparisonOperator;
    use std::sync::Arc;
    use std::time::Duration;

    fn extractor(client: MockModelClient) -> IntentExtractor {
        IntentExtractor::new(ModelGateway::new(Arc::new(client), Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_extracts_location_and_bound() {
        let query = "Show me all orders where the buyer was located in Ohio and total value was over 500";
        let client = MockModelClient::new().respond_when(
            "located in Ohio",
            r#"{"locationFilter":"Ohio","minTotal":500,"maxTotal":null,
                "comparisonOperators":{"minTotal":"greater_than","maxTotal":null}}"#,
        );

        let intent = extractor(client).extract(query).await.unwrap();
        assert_eq!(intent.location_filter(), Some("Ohio"));
        assert_eq!(intent.min_total(), Some((ComparisonOperator::GreaterThan, 500.0)));
        assert_eq!(intent.raw_query(), query);
    }

    #[tokio::test]
    async fn test_malformed_output_is_fatal() {
        let client = MockModelClient::new().respond_when("User query", "I think you want Ohio orders.");
        let err = extractor(client).extract("Ohio orders").await.unwrap_err();
        assert!(matches!(
            err,
            IntentExtractionError::Extraction(ExtractionFailure::MalformedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn test_string_bound_violates_schema() {
        let client = MockModelClient::new().respond_when(
            "User query",
            r#"{"locationFilter":null,"minTotal":"500","maxTotal":null,"comparisonOperators":null}"#,
        );
        let err = extractor(client).extract("over 500").await.unwrap_err();
        assert!(matches!(
            err,
            IntentExtractionError::Extraction(ExtractionFailure::SchemaViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_inconsistent_draft_is_rejected() {
        let client = MockModelClient::new().respond_when(
            "User query",
            r#"{"locationFilter":null,"minTotal":null,"maxTotal":null,
                "comparisonOperators":{"minTotal":"greater_than","maxTotal":null}}"#,
        );
        let err = extractor(client).extract("big orders").await.unwrap_err();
        assert!(matches!(
            err,
            IntentExtractionError::Rejected(IntentError::OperatorWithoutValue { .. })
        ));
    }
}
