//! Property-based checks of the cutter and the splitter over generated text.

use mdsplit_chunk::metadata::calculate_hash;
use mdsplit_chunk::sentence::RegexSentenceSplitter;
use mdsplit_chunk::tokenizer::TiktokenTokenizer;
use mdsplit_chunk::{ChunkConfig, ChunkCutter, Document, SemanticSplitter, Tokenizer};
use proptest::prelude::*;
use std::sync::{Arc, LazyLock};

static TOKENIZER: LazyLock<Arc<dyn Tokenizer>> =
    LazyLock::new(|| Arc::new(TiktokenTokenizer::cl100k().unwrap()));

fn splitter(token_limit: usize, token_limit_min: usize) -> SemanticSplitter {
    SemanticSplitter::new(
        ChunkConfig {
            token_limit,
            token_limit_buffer: 0,
            token_limit_min,
            ..Default::default()
        },
        TOKENIZER.clone(),
        Arc::new(RegexSentenceSplitter::new()),
    )
    .unwrap()
}

/// Markdown made of optional headings and paragraphs of plain sentences.
fn plain_markdown() -> impl Strategy<Value = String> {
    let sentence = "[A-Z][a-z]{1,8}( [a-z]{1,8}){2,12}\\.";
    let paragraph = prop::collection::vec(sentence, 1..6).prop_map(|s| s.join(" "));
    let block = (prop::option::of((1u8..4, "[A-Z][a-z]{2,8}")), paragraph).prop_map(
        |(heading, paragraph)| match heading {
            Some((level, title)) => {
                format!("{} {}\n\n{}", "#".repeat(level as usize), title, paragraph)
            }
            None => paragraph,
        },
    );
    prop::collection::vec(block, 1..8).prop_map(|blocks| blocks.join("\n\n"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_cut_reconstructs_input(text in "\\PC{0,200}", budget in 0usize..40) {
        let cut = ChunkCutter::new(TOKENIZER.clone()).cut(&text, budget);
        prop_assert_eq!(format!("{}{}", cut.kept, cut.discarded), text);
    }

    #[test]
    fn test_cut_fits_budget_for_plain_words(
        words in prop::collection::vec("[a-z]{1,10}", 1..60),
        budget in 1usize..30,
    ) {
        let text = words.join(" ");
        let cut = ChunkCutter::new(TOKENIZER.clone()).cut(&text, budget);

        // Only a lone first word may exceed the budget
        prop_assert!(
            cut.kept_tokens <= budget || !cut.kept.contains(' '),
            "kept {:?} with {} tokens for budget {}",
            cut.kept,
            cut.kept_tokens,
            budget
        );
        prop_assert_eq!(cut.kept_tokens, TOKENIZER.count(&cut.kept));
    }

    #[test]
    fn test_chunk_metadata_is_consistent(text in plain_markdown(), limit in 20usize..80) {
        let s = splitter(limit, 5);
        let doc = Document::new(text.clone());
        let chunks = s.split(&doc);
        let hash = calculate_hash(&text);

        prop_assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.metadata.chunk_index, i);
            prop_assert_eq!(chunk.metadata.chunks_count, chunks.len());
            prop_assert_eq!(&chunk.metadata.source_hash, &hash);
            prop_assert_eq!(chunk.metadata.token_len, TOKENIZER.count(&chunk.text));
            prop_assert_eq!(chunk.metadata.char_len, chunk.text.chars().count());
            prop_assert!(!chunk.text.trim().is_empty());
        }
    }

    #[test]
    fn test_plain_chunks_fit_budget(text in plain_markdown(), limit in 20usize..80) {
        for chunk in splitter(limit, 5).split(&Document::new(text)) {
            prop_assert!(
                chunk.metadata.token_len <= limit,
                "{} tokens over {}: {:?}",
                chunk.metadata.token_len,
                limit,
                chunk.text
            );
        }
    }

    #[test]
    fn test_split_is_deterministic(text in plain_markdown(), limit in 20usize..80) {
        let s = splitter(limit, 5);
        let doc = Document::new(text);
        prop_assert_eq!(s.split_with_report(&doc), s.split_with_report(&doc));
    }
}
