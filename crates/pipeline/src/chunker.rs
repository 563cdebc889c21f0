//! Text chunking module
//!
//! Splits raw order text into bounded segments for single-pass extraction.
//! Splitting prefers newline runs (record separators), then words, then
//! graphemes. Trimming is disabled so chunks are contiguous slices of the
//! input and nothing is dropped between them.

use crate::errors::ChunkerError;
use order_agent_common::config::{BudgetUnit, ExtractionConfig};
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// Maximum chunk size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkBudget {
    /// Count of `char`s
    Characters(usize),
    /// Count of cl100k tokens
    Tokens(usize),
}

impl ChunkBudget {
    pub fn limit(&self) -> usize {
        match self {
            ChunkBudget::Characters(n) | ChunkBudget::Tokens(n) => *n,
        }
    }
}

impl From<&ExtractionConfig> for ChunkBudget {
    fn from(config: &ExtractionConfig) -> Self {
        match config.budget_unit {
            BudgetUnit::Characters => ChunkBudget::Characters(config.chunk_budget),
            BudgetUnit::Tokens => ChunkBudget::Tokens(config.chunk_budget),
        }
    }
}

/// A contiguous slice of the raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// The chunk content
    pub content: &'a str,
    /// Index of this chunk in the document
    pub index: usize,
    /// Start byte position in original text
    pub start_pos: usize,
    /// End byte position in original text (exclusive)
    pub end_pos: usize,
}

enum Splitter {
    Characters(TextSplitter<Characters>),
    Tokens(TextSplitter<CoreBPE>),
}

/// Smallest token budget that always fits one `char` (up to 4 cl100k tokens)
pub const MIN_TOKEN_BUDGET: usize = 4;

/// Splits text under a fixed budget. Reusable across inputs.
pub struct Chunker {
    budget: ChunkBudget,
    splitter: Splitter,
}

impl Chunker {
    pub fn new(budget: ChunkBudget) -> Result<Self, ChunkerError> {
        if budget.limit() == 0 {
            return Err(ChunkerError::ZeroBudget);
        }
        if let ChunkBudget::Tokens(n) = budget {
            if n < MIN_TOKEN_BUDGET {
                return Err(ChunkerError::TokenBudgetTooSmall {
                    budget: n,
                    minimum: MIN_TOKEN_BUDGET,
                });
            }
        }

        let splitter = match budget {
            ChunkBudget::Characters(n) => {
                Splitter::Characters(TextSplitter::new(ChunkConfig::new(n).with_trim(false)))
            }
            ChunkBudget::Tokens(n) => {
                let tokenizer = tiktoken_rs::cl100k_base().map_err(|e| ChunkerError::Tokenizer {
                    message: e.to_string(),
                })?;
                Splitter::Tokens(TextSplitter::new(
                    ChunkConfig::new(n).with_sizer(tokenizer).with_trim(false),
                ))
            }
        };

        Ok(Self { budget, splitter })
    }

    pub fn budget(&self) -> ChunkBudget {
        self.budget
    }

    /// Lazily split `text`. Calling again restarts from the beginning.
    pub fn chunks<'a>(&'a self, text: &'a str) -> impl Iterator<Item = TextChunk<'a>> + 'a {
        let indices: Box<dyn Iterator<Item = (usize, &'a str)> + 'a> = match &self.splitter {
            Splitter::Characters(s) => Box::new(s.chunk_indices(text)),
            Splitter::Tokens(s) => Box::new(s.chunk_indices(text)),
        };

        indices.enumerate().map(|(index, (start_pos, content))| TextChunk {
            content,
            index,
            start_pos,
            end_pos: start_pos + content.len(),
        })
    }

    /// Split eagerly, logging the outcome
    pub fn chunk_text<'a>(&'a self, text: &'a str) -> Vec<TextChunk<'a>> {
        let chunks: Vec<_> = self.chunks(text).collect();

        debug!(
            input_len = text.len(),
            chunk_count = chunks.len(),
            budget = self.budget.limit(),
            "Text chunked"
        );

        chunks
    }
}
