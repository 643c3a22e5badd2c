//! Input and output records of the chunking engine.

use serde::{Deserialize, Serialize};

/// A source document to be chunked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Markdown text
    pub text: String,

    /// Where the document came from
    #[serde(default)]
    pub url: String,

    /// Free-form keywords copied onto every chunk
    #[serde(default)]
    pub keywords: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: String::new(),
            keywords: String::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }
}

/// A token-bounded piece of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text content
    pub text: String,

    /// Source document URL
    pub url: String,

    /// Source document keywords
    pub keywords: String,

    /// Position and size information
    pub metadata: ChunkMetadata,
}

/// Metadata about a chunk's position in its document and its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Chunk position in document (0-indexed)
    pub chunk_index: usize,

    /// Number of chunks the document produced
    pub chunks_count: usize,

    /// SHA-256 hex digest of the full source text
    pub source_hash: String,

    /// Token count of `text`
    pub token_len: usize,

    /// Character count of `text`
    pub char_len: usize,
}

/// A record of text truncated by the cutter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationEvent {
    /// Hash of the document the span belongs to
    pub source_hash: String,

    /// The span that had to be cut
    pub span: String,

    /// Byte offset in `span` where the cut was made
    pub cut_at: usize,

    /// Tokens in the kept prefix
    pub kept_tokens: usize,

    /// Text after the cut point
    pub discarded: String,
}

/// Chunks together with the cuts made while producing them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReport {
    pub chunks: Vec<Chunk>,
    pub truncations: Vec<TruncationEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_deserialize_defaults() {
        let doc: Document = serde_json::from_str(r##"{"text": "# Title"}"##).unwrap();
        assert_eq!(doc.text, "# Title");
        assert!(doc.url.is_empty());
        assert!(doc.keywords.is_empty());
    }

    #[test]
    fn test_document_builder() {
        let doc = Document::new("body")
            .with_url("https://example.com/a")
            .with_keywords("alpha beta");
        assert_eq!(doc.url, "https://example.com/a");
        assert_eq!(doc.keywords, "alpha beta");
    }
}
