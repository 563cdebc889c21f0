//! Pipeline error types

use order_agent_common::errors::{ErrorCode, FetchError, IntentExtractionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChunkerError {
    #[error("Chunk budget must be greater than zero")]
    ZeroBudget,

    #[error("Token budget {budget} is below the minimum of {minimum}")]
    TokenBudgetTooSmall { budget: usize, minimum: usize },

    #[error("Tokenizer unavailable: {message}")]
    Tokenizer { message: String },
}

/// Errors that abort a request
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    IntentExtraction(#[from] IntentExtractionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkerError),

    #[error("Request cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::IntentExtraction(e) => e.code(),
            PipelineError::Fetch(e) => e.code(),
            PipelineError::Chunking(_) => ErrorCode::ConfigurationError,
            PipelineError::Cancelled => ErrorCode::Cancelled,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        self.code().exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use order_agent_common::errors::ExtractionFailure;

    #[test]
    fn test_exit_codes() {
        let intent: PipelineError = IntentExtractionError::from(ExtractionFailure::Timeout { timeout_ms: 10 }).into();
        assert_eq!(intent.exit_code(), 2);
        assert_eq!(PipelineError::Cancelled.exit_code(), 130);
        assert_eq!(PipelineError::from(ChunkerError::ZeroBudget).exit_code(), 4);
    }
}
