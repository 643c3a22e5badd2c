//! Structure-aware chunking of Markdown documents.
//!
//! This module:
//! - Parses ATX headings into a section tree
//! - Keeps whole sections together when they fit the token budget
//! - Falls back to table-aware packing, sentence packing and cutting
//! - Merges undersized pieces into their neighbours
//! - Prefixes pieces with their ancestor headings

mod breadcrumbs;
mod fallback;
mod merging;
mod pipeline;
mod tree;

pub use fallback::Fallback;
pub use pipeline::{ChunkConfig, SemanticSplitter};
pub use tree::DocumentNode;
