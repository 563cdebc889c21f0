//! Error types for the order agent
//!
//! Fatal and non-fatal failures are kept apart:
//! - `ExtractionFailure` is returned by the model gateway for one call
//! - `ValidationError` rejects a single extracted record
//! - `IntentError` rejects a structurally valid but unusable intent
//! - `FetchError` means the raw order text could not be obtained
//!
//! Every error maps to a stable `ErrorCode` for logs and process exit status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Extraction errors (1xxx)
    IntentExtractionFailed,
    IntentRejected,
    ChunkExtractionFailed,
    RecordRejected,

    // Model provider errors (2xxx)
    ProviderError,
    ProviderTimeout,
    MalformedOutput,
    SchemaViolation,

    // Upstream data errors (3xxx)
    FetchFailed,

    // Request lifecycle (4xxx)
    Cancelled,

    // Internal errors (9xxx)
    ConfigurationError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::IntentExtractionFailed => 1001,
            ErrorCode::IntentRejected => 1002,
            ErrorCode::ChunkExtractionFailed => 1003,
            ErrorCode::RecordRejected => 1004,

            ErrorCode::ProviderError => 2001,
            ErrorCode::ProviderTimeout => 2002,
            ErrorCode::MalformedOutput => 2003,
            ErrorCode::SchemaViolation => 2004,

            ErrorCode::FetchFailed => 3001,

            ErrorCode::Cancelled => 4001,

            ErrorCode::ConfigurationError => 9001,
            ErrorCode::InternalError => 9002,
        }
    }

    /// Process exit status for errors that abort a request
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorCode::IntentExtractionFailed | ErrorCode::IntentRejected => 2,
            ErrorCode::FetchFailed => 3,
            ErrorCode::ConfigurationError => 4,
            ErrorCode::Cancelled => 130,
            _ => 1,
        }
    }
}

/// Failure talking to the model provider
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider returned no completion")]
    EmptyCompletion,

    #[error("No scripted response for prompt")]
    Unscripted,

    #[error("{message}")]
    Other { message: String },
}

/// Outcome of a gateway call that produced no usable typed object
#[derive(Error, Debug)]
pub enum ExtractionFailure {
    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Model output is not valid JSON: {message}")]
    MalformedOutput { message: String },

    #[error("Model output violates schema {schema}: {message}")]
    SchemaViolation {
        schema: &'static str,
        message: String,
    },

    #[error("Model call cancelled")]
    Cancelled,
}

impl ExtractionFailure {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractionFailure::Provider(_) => ErrorCode::ProviderError,
            ExtractionFailure::Timeout { .. } => ErrorCode::ProviderTimeout,
            ExtractionFailure::MalformedOutput { .. } => ErrorCode::MalformedOutput,
            ExtractionFailure::SchemaViolation { .. } => ErrorCode::SchemaViolation,
            ExtractionFailure::Cancelled => ErrorCode::Cancelled,
        }
    }
}

/// A single extracted record that cannot be coerced into an `OrderRecord`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Record is not an object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("Field {field} must be {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field {field} is not a number: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("Record carries no fields")]
    EmptyRecord,
}

/// An intent draft that passed the schema but cannot drive the filter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntentError {
    #[error("Operator given for {bound} without a value")]
    OperatorWithoutValue { bound: &'static str },

    #[error("Operator {operator} is not valid for {bound}")]
    OperatorNotAllowed {
        bound: &'static str,
        operator: &'static str,
    },

    #[error("Bound {bound} is not a finite number")]
    NonFiniteBound { bound: &'static str },
}

/// Intent extraction failed; the request cannot continue
#[derive(Error, Debug)]
pub enum IntentExtractionError {
    #[error("Intent extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    #[error("Intent rejected: {0}")]
    Rejected(#[from] IntentError),
}

impl IntentExtractionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            IntentExtractionError::Extraction(ExtractionFailure::Cancelled) => ErrorCode::Cancelled,
            IntentExtractionError::Extraction(_) => ErrorCode::IntentExtractionFailed,
            IntentExtractionError::Rejected(_) => ErrorCode::IntentRejected,
        }
    }
}

/// The raw order text could not be obtained
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Orders request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Orders API {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Orders source {source_name} unavailable: {message}")]
    Unavailable {
        source_name: String,
        message: String,
    },
}

impl FetchError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::FetchFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = ExtractionFailure::Timeout { timeout_ms: 500 };
        assert_eq!(err.code(), ErrorCode::ProviderTimeout);
        assert_eq!(err.code().as_code(), 2002);
    }

    #[test]
    fn test_fatal_exit_codes() {
        let intent = IntentExtractionError::from(ExtractionFailure::MalformedOutput {
            message: "eof".into(),
        });
        assert_eq!(intent.code().exit_code(), 2);

        let fetch = FetchError::Status {
            url: "http://localhost:5001/api/orders".into(),
            status: 503,
        };
        assert_eq!(fetch.code().exit_code(), 3);
        assert!(fetch.to_string().contains("503"));
    }

    #[test]
    fn test_cancelled_intent_maps_to_cancelled() {
        let err = IntentExtractionError::from(ExtractionFailure::Cancelled);
        assert_eq!(err.code(), ErrorCode::Cancelled);
        assert_eq!(err.code().exit_code(), 130);
    }

    #[test]
    fn test_validation_error_message() {
        let err = ValidationError::WrongType {
            field: "buyer",
            expected: "string or null",
            found: "boolean",
        };
        assert_eq!(
            err.to_string(),
            "Field buyer must be string or null, found boolean"
        );
    }
}
