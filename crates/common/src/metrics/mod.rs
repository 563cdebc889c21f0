//! Metrics and observability utilities
//!
//! Counters and histograms for each pipeline stage, with standardized
//! naming. Without an installed recorder every call is a no-op.

use crate::errors::ErrorCode;
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all order agent metrics
pub const METRICS_PREFIX: &str = "order_agent";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_model_calls_total", METRICS_PREFIX),
        Unit::Count,
        "Total model gateway calls by schema and outcome"
    );

    describe_histogram!(
        format!("{}_model_call_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Model gateway call latency in seconds"
    );

    describe_counter!(
        format!("{}_chunks_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks processed by outcome"
    );

    describe_counter!(
        format!("{}_records_extracted_total", METRICS_PREFIX),
        Unit::Count,
        "Records accepted from model output"
    );

    describe_counter!(
        format!("{}_records_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Records dropped by validation"
    );

    describe_counter!(
        format!("{}_duplicates_removed_total", METRICS_PREFIX),
        Unit::Count,
        "Records removed by order id deduplication"
    );

    describe_counter!(
        format!("{}_records_discarded_total", METRICS_PREFIX),
        Unit::Count,
        "Records excluded by the filter engine"
    );

    tracing::debug!("Metrics registered");
}

/// Record one model gateway call
pub fn record_model_call(duration_secs: f64, schema: &'static str, error: Option<ErrorCode>) {
    let outcome = match error {
        None => "success",
        Some(ErrorCode::ProviderTimeout) => "timeout",
        Some(ErrorCode::Cancelled) => "cancelled",
        Some(ErrorCode::MalformedOutput) | Some(ErrorCode::SchemaViolation) => "invalid_output",
        Some(_) => "error",
    };

    counter!(
        format!("{}_model_calls_total", METRICS_PREFIX),
        "schema" => schema,
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        format!("{}_model_call_duration_seconds", METRICS_PREFIX),
        "schema" => schema
    )
    .record(duration_secs);
}

/// Record the outcome of one chunk extraction
pub fn record_chunk(success: bool, accepted: usize, rejected: usize) {
    let outcome = if success { "extracted" } else { "failed" };

    counter!(
        format!("{}_chunks_total", METRICS_PREFIX),
        "outcome" => outcome
    )
    .increment(1);

    counter!(format!("{}_records_extracted_total", METRICS_PREFIX)).increment(accepted as u64);
    counter!(format!("{}_records_rejected_total", METRICS_PREFIX)).increment(rejected as u64);
}

/// Record merge and filter totals for one run
pub fn record_run(duplicates_removed: usize, discarded: usize) {
    counter!(format!("{}_duplicates_removed_total", METRICS_PREFIX))
        .increment(duplicates_removed as u64);
    counter!(format!("{}_records_discarded_total", METRICS_PREFIX)).increment(discarded as u64);
}
