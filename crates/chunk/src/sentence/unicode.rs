//! UAX #29 sentence boundaries.

use super::SentenceSplitter;
use unicode_segmentation::UnicodeSegmentation;

/// Sentence splitter following the Unicode sentence boundary rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn name(&self) -> &str {
        "unicode"
    }

    fn get_sentences(&self, text: &str) -> Vec<String> {
        text.split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_sentences() {
        let sentences =
            UnicodeSentenceSplitter.get_sentences("Mr. Fox jumped. The dog was sleeping! Why?");
        assert_eq!(sentences.last().map(String::as_str), Some("Why?"));
        assert!(sentences.contains(&"The dog was sleeping!".to_string()));
    }

    #[test]
    fn test_keeps_all_text() {
        let text = "Erste Zeile. Zweite Zeile 🙂. Dritte?";
        let joined: String = UnicodeSentenceSplitter
            .get_sentences(text)
            .join(" ");
        assert_eq!(joined, text);
    }

    #[test]
    fn test_empty() {
        assert!(UnicodeSentenceSplitter.get_sentences("  \n ").is_empty());
    }
}
