//! mdsplit chunking engine
//!
//! Splits Markdown documents into token-bounded chunks:
//! - Tokenizers (tiktoken encodings, Hugging Face `tokenizer.json`)
//! - Sentence splitters (heuristic, Unicode, statistical, pluggable)
//! - Table-aware packing that never breaks a row
//! - Truncation that never cuts through code, links or URLs
//! - The `SemanticSplitter` orchestrator

pub mod cutter;
pub mod metadata;
pub mod models;
pub mod protect;
pub mod semantic;
pub mod sentence;
pub mod table;
pub mod tokenizer;
pub mod types;

pub use cutter::{ChunkCutter, Cut};
pub use models::ModelStore;
pub use semantic::{ChunkConfig, DocumentNode, SemanticSplitter};
pub use sentence::{SentenceSplitter, SentenceSplitterRegistry};
pub use table::{TableSplitMetrics, TableSplitter};
pub use tokenizer::Tokenizer;
pub use types::{Chunk, ChunkMetadata, Document, SplitReport, TruncationEvent};

// Re-export core types for convenience
pub use mdsplit_core::{AppError, AppResult};
