//! Order Extractor
//!
//! Runs one gateway call per chunk, validates each returned record, then
//! merges all chunks into a first-seen, order-id-deduplicated list.
//!
//! Chunk calls run concurrently up to a fixed limit. Results are re-sorted by
//! chunk index before merging, so the earlier chunk always wins a duplicate
//! regardless of completion order.

use crate::chunker::TextChunk;
use crate::prompts;
use futures::stream::{self, StreamExt};
use order_agent_common::errors::{ErrorCode, ExtractionFailure, ValidationError};
use order_agent_common::gateway::ModelGateway;
use order_agent_common::metrics;
use order_agent_common::schema::{OrderBatch, OrderRecord};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// A chunk that contributed no records
#[derive(Debug)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub failure: ExtractionFailure,
}

/// A record dropped by validation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRejection {
    pub chunk_index: usize,
    /// Position of the record within the chunk's model output
    pub position: usize,
    pub error: ValidationError,
}

impl ChunkFailure {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::ChunkExtractionFailed
    }
}

impl RecordRejection {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::RecordRejected
    }
}

/// Merged records plus an audit of everything that was lost on the way
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub records: Vec<OrderRecord>,
    pub chunks_total: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    pub rejected_records: Vec<RecordRejection>,
    pub duplicates_removed: usize,
}

impl ExtractionReport {
    /// True if any chunk was abandoned because the request was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.failed_chunks
            .iter()
            .any(|f| matches!(f.failure, ExtractionFailure::Cancelled))
    }
}

struct ChunkOutcome {
    chunk_index: usize,
    result: Result<Vec<OrderRecord>, ChunkFailure>,
    rejected: Vec<RecordRejection>,
}

pub struct OrderExtractor {
    gateway: ModelGateway,
    max_concurrency: usize,
}

impl OrderExtractor {
    pub fn new(gateway: ModelGateway, max_concurrency: usize) -> Self {
        Self {
            gateway,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Extract and merge records from `chunks`
    #[instrument(skip_all, fields(max_concurrency = self.max_concurrency))]
    pub async fn extract(&self, chunks: Vec<TextChunk<'_>>) -> ExtractionReport {
        let chunks_total = chunks.len();

        let mut outcomes: Vec<ChunkOutcome> = stream::iter(chunks)
            .map(|chunk| self.extract_chunk(chunk))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        outcomes.sort_by_key(|o| o.chunk_index);

        let mut report = ExtractionReport {
            chunks_total,
            ..Default::default()
        };
        let mut batches = Vec::with_capacity(outcomes.len());

        for outcome in outcomes {
            report.rejected_records.extend(outcome.rejected);
            match outcome.result {
                Ok(records) => batches.push(records),
                Err(failure) => report.failed_chunks.push(failure),
            }
        }

        let (records, duplicates_removed) = merge_records(batches);
        report.records = records;
        report.duplicates_removed = duplicates_removed;

        info!(
            chunks = chunks_total,
            failed_chunks = report.failed_chunks.len(),
            rejected_records = report.rejected_records.len(),
            duplicates_removed,
            records = report.records.len(),
            "Order extraction complete"
        );

        report
    }

    async fn extract_chunk(&self, chunk: TextChunk<'_>) -> ChunkOutcome {
        let chunk_index = chunk.index;

        if chunk.content.trim().is_empty() {
            debug!(chunk = chunk_index, "Skipping blank chunk");
            return ChunkOutcome {
                chunk_index,
                result: Ok(Vec::new()),
                rejected: Vec::new(),
            };
        }

        let batch: OrderBatch = match self.gateway.extract(&prompts::order_prompt(chunk.content)).await {
            Ok(batch) => batch,
            Err(failure) => {
                let failure = ChunkFailure { chunk_index, failure };
                warn!(
                    chunk = chunk_index,
                    start_pos = chunk.start_pos,
                    end_pos = chunk.end_pos,
                    code = failure.code().as_code(),
                    cause = failure.failure.code().as_code(),
                    error = %failure.failure,
                    "Chunk extraction failed; contributing zero records"
                );
                metrics::record_chunk(false, 0, 0);
                return ChunkOutcome {
                    chunk_index,
                    result: Err(failure),
                    rejected: Vec::new(),
                };
            }
        };

        let mut records = Vec::with_capacity(batch.orders.len());
        let mut rejected = Vec::new();

        for (position, value) in batch.orders.iter().enumerate() {
            match OrderRecord::from_extracted(value) {
                Ok(record) => records.push(record),
                Err(error) => {
                    let rejection = RecordRejection {
                        chunk_index,
                        position,
                        error,
                    };
                    warn!(
                        chunk = chunk_index,
                        position,
                        code = rejection.code().as_code(),
                        reason = %rejection.error,
                        "Dropping invalid record"
                    );
                    rejected.push(rejection);
                }
            }
        }

        metrics::record_chunk(true, records.len(), rejected.len());
        debug!(chunk = chunk_index, accepted = records.len(), rejected = rejected.len(), "Chunk extracted");

        ChunkOutcome {
            chunk_index,
            result: Ok(records),
            rejected,
        }
    }
}

/// Merge per-chunk batches (already in chunk order), keeping the first
/// record seen for each order id. Records without an id are always kept.
///
/// Returns the merged records and the number of duplicates removed.
pub fn merge_records(batches: Vec<Vec<OrderRecord>>) -> (Vec<OrderRecord>, usize) {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut duplicates = 0;

    for record in batches.into_iter().flatten() {
        match &record.order_id {
            Some(id) if !seen.insert(id.clone()) => {
                debug!(order_id = %id, "Dropping duplicate order");
                duplicates += 1;
            }
            _ => merged.push(record),
        }
    }

    (merged, duplicates)
}
