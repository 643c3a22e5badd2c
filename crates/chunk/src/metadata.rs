//! Metadata enrichment utilities.

use sha2::{Digest, Sha256};

use crate::tokenizer::Tokenizer;
use crate::types::{Chunk, ChunkMetadata, Document};

/// Calculate SHA-256 hash of text.
pub fn calculate_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Turn finished pieces into chunks carrying the document's metadata.
///
/// Pieces are trimmed and empty ones dropped before indices are assigned.
pub(crate) fn build_chunks(
    document: &Document,
    source_hash: &str,
    pieces: Vec<String>,
    tokenizer: &dyn Tokenizer,
) -> Vec<Chunk> {
    let texts: Vec<String> = pieces
        .into_iter()
        .map(|piece| piece.trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect();

    let chunks_count = texts.len();

    texts
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| {
            let token_len = tokenizer.count(&text);
            let char_len = text.chars().count();
            Chunk {
                text,
                url: document.url.clone(),
                keywords: document.keywords.clone(),
                metadata: ChunkMetadata {
                    chunk_index,
                    chunks_count,
                    source_hash: source_hash.to_string(),
                    token_len,
                    char_len,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TiktokenTokenizer;

    #[test]
    fn test_calculate_hash() {
        let text = "Hello, world!";
        let hash = calculate_hash(text);
        assert_eq!(hash.len(), 64); // SHA-256 produces 64 hex chars

        assert_eq!(
            calculate_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        // Different text should produce different hash
        let hash3 = calculate_hash("Different text");
        assert_ne!(hash, hash3);
    }

    #[test]
    fn test_build_chunks_assigns_positions() {
        let tokenizer = TiktokenTokenizer::cl100k().unwrap();
        let doc = Document::new("ignored").with_url("u").with_keywords("k");
        let pieces = vec![
            "  first  ".to_string(),
            "   ".to_string(),
            "second ü".to_string(),
        ];

        let chunks = build_chunks(&doc, "abc", pieces, &tokenizer);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "first");
        assert_eq!(chunks[1].metadata.chunk_index, 1);
        assert!(chunks.iter().all(|c| c.metadata.chunks_count == 2));
        assert!(chunks.iter().all(|c| c.url == "u" && c.keywords == "k"));
        assert_eq!(chunks[1].metadata.char_len, 8);
        assert_eq!(chunks[0].metadata.token_len, tokenizer.count("first"));
    }
}
