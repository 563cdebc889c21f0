//! Orchestrator
//!
//! Sequences one request: fetch raw text, extract intent, chunk, extract
//! orders, filter. Only the fetch and intent stages can fail the request;
//! chunk failures degrade to fewer records.

use crate::chunker::{ChunkBudget, Chunker};
use crate::errors::PipelineError;
use crate::filter::apply_filters;
use crate::intent::IntentExtractor;
use crate::orders::OrderExtractor;
use order_agent_common::config::ExtractionConfig;
use order_agent_common::errors::{ExtractionFailure, IntentExtractionError};
use order_agent_common::gateway::ModelGateway;
use order_agent_common::metrics;
use order_agent_common::orders_api::OrdersSource;
use order_agent_common::schema::{Intent, OrderRecord};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Chunking and concurrency settings
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub chunk_budget: ChunkBudget,
    pub max_concurrency: usize,
}

impl From<&ExtractionConfig> for PipelineOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            chunk_budget: ChunkBudget::from(config),
            max_concurrency: config.max_concurrency,
        }
    }
}

/// The response contract: `{"orders": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderRecord>,
}

/// Counters describing one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub chunks_total: usize,
    pub failed_chunks: usize,
    pub rejected_records: usize,
    pub duplicates_removed: usize,
    pub extracted: usize,
    pub discarded: usize,
}

/// Everything produced by a successful run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub intent: Intent,
    pub stats: RunStats,
    pub response: OrdersResponse,
}

pub struct Pipeline {
    source: Arc<dyn OrdersSource>,
    intents: IntentExtractor,
    orders: OrderExtractor,
    chunker: Chunker,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Build a pipeline. Cancellation follows the gateway's token.
    pub fn new(
        gateway: ModelGateway,
        source: Arc<dyn OrdersSource>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let chunker = Chunker::new(options.chunk_budget)?;
        let cancel = gateway.cancellation().clone();

        Ok(Self {
            source,
            intents: IntentExtractor::new(gateway.clone()),
            orders: OrderExtractor::new(gateway, options.max_concurrency),
            chunker,
            cancel,
        })
    }

    /// Answer `query` against the current orders
    pub async fn run(&self, query: &str) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id, source = %self.source.describe());

        async {
            let raw = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                fetched = self.source.fetch_raw() => fetched?,
            };
            info!(bytes = raw.len(), "Fetched raw orders");

            let intent = self.intents.extract(query).await.map_err(|e| match e {
                IntentExtractionError::Extraction(ExtractionFailure::Cancelled) => PipelineError::Cancelled,
                other => PipelineError::IntentExtraction(other),
            })?;

            let chunks = self.chunker.chunk_text(&raw);
            let report = self.orders.extract(chunks).await;
            if report.was_cancelled() || self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let extracted = report.records.len();
            let outcome = apply_filters(&intent, report.records);

            let stats = RunStats {
                chunks_total: report.chunks_total,
                failed_chunks: report.failed_chunks.len(),
                rejected_records: report.rejected_records.len(),
                duplicates_removed: report.duplicates_removed,
                extracted,
                discarded: outcome.discarded,
            };
            metrics::record_run(stats.duplicates_removed, stats.discarded);

            info!(
                extracted,
                matched = outcome.matched.len(),
                discarded = outcome.discarded,
                failed_chunks = stats.failed_chunks,
                "Run complete"
            );

            Ok(PipelineRun {
                run_id,
                intent,
                stats,
                response: OrdersResponse {
                    orders: outcome.matched,
                },
            })
        }
        .instrument(span)
        .await
    }
}
