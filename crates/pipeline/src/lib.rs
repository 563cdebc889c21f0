//! Order Agent Pipeline
//!
//! Answers a natural-language order query in five stages:
//! 1. Fetch the raw order text from the orders source
//! 2. Extract a structured intent from the query (model, schema-constrained)
//! 3. Chunk the raw text
//! 4. Extract order records per chunk (model, schema-constrained) and merge
//! 5. Apply the intent with the deterministic filter engine
//!
//! The model only ever parses. Every pass/fail decision happens in [`filter`].

pub mod chunker;
pub mod errors;
pub mod filter;
pub mod intent;
pub mod orders;
pub mod pipeline;
pub mod prompts;

pub use chunker::{ChunkBudget, Chunker, TextChunk};
pub use errors::{ChunkerError, PipelineError};
pub use filter::{apply_filters, normalize_location, FilterOutcome};
pub use intent::IntentExtractor;
pub use orders::{ExtractionReport, OrderExtractor};
pub use pipeline::{OrdersResponse, Pipeline, PipelineOptions, PipelineRun, RunStats};
