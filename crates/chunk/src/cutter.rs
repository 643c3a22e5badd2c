//! Last-resort truncation of text to a token budget.
//!
//! The cut point is the end of the first `budget` tokens, rounded down to the
//! end of a word that still fits. A cut that lands inside a protected span (code, link, URL,
//! e-mail) is moved to the end of that span instead, even if the kept part
//! then exceeds the budget.

use crate::protect::{enclosing_span, protected_spans};
use crate::tokenizer::Tokenizer;
use std::ops::Range;
use std::sync::Arc;

/// Result of cutting a text: `kept + discarded` is the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cut {
    pub kept: String,
    pub discarded: String,
    /// Byte offset of the cut
    pub cut_at: usize,
    /// Token count of `kept`
    pub kept_tokens: usize,
}

impl Cut {
    pub fn is_truncated(&self) -> bool {
        !self.discarded.is_empty()
    }
}

/// Truncates text to a token budget without breaking protected spans.
#[derive(Debug, Clone)]
pub struct ChunkCutter {
    tokenizer: Arc<dyn Tokenizer>,
}

impl ChunkCutter {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// The kept part of [`ChunkCutter::cut`].
    pub fn cut_to_length(&self, text: &str, budget: usize) -> String {
        self.cut(text, budget).kept
    }

    /// Split `text` into a prefix of at most `budget` tokens and the rest.
    pub fn cut(&self, text: &str, budget: usize) -> Cut {
        let total = self.tokenizer.count(text);
        if total <= budget {
            return Cut {
                kept: text.to_string(),
                discarded: String::new(),
                cut_at: text.len(),
                kept_tokens: total,
            };
        }

        let spans = protected_spans(text);
        let mut cut_at = self.cut_point(text, budget, &spans);
        while let Some(span) = enclosing_span(&spans, cut_at) {
            tracing::debug!(
                "Cut at byte {} falls inside a protected span, extending to {}",
                cut_at,
                span.end
            );
            cut_at = span.end;
        }

        let (kept, discarded) = text.split_at(cut_at);
        Cut {
            kept_tokens: self.tokenizer.count(kept),
            kept: kept.to_string(),
            discarded: discarded.to_string(),
            cut_at,
        }
    }

    /// Cut point within the budget: the end of the first `budget` tokens,
    /// rounded down to the last word end that still fits unless it lies inside
    /// a protected span.
    fn cut_point(&self, text: &str, budget: usize, spans: &[Range<usize>]) -> usize {
        let word_ends = word_ends(text);

        let precise = self
            .token_prefix_len(text, budget)
            .or_else(|| self.largest_fitting(text, budget));
        let Some(precise) = precise else {
            // Not even one character fits; keep the first word
            return word_ends.first().copied().unwrap_or(text.len());
        };

        if enclosing_span(spans, precise).is_some() {
            return precise;
        }

        // Prefix counts are not monotonic under BPE, so each candidate is re-counted
        word_ends
            .iter()
            .rev()
            .filter(|&&end| end <= precise)
            .find(|&&end| self.tokenizer.count(&text[..end]) <= budget)
            .copied()
            .unwrap_or(precise)
    }

    /// Byte length of the text covered by its first `budget` tokens.
    ///
    /// `None` when the decoded tokens are not a prefix of `text` (normalizing
    /// tokenizers) or do not fit when counted on their own.
    fn token_prefix_len(&self, text: &str, budget: usize) -> Option<usize> {
        let ids = self.tokenizer.encode(text);
        let take = budget.min(ids.len());

        // A token may end inside a multi-byte character; back off a few ids
        (take.saturating_sub(3).max(1)..=take)
            .rev()
            .filter_map(|k| self.tokenizer.decode(&ids[..k]).ok())
            .find(|prefix| !prefix.is_empty() && text.starts_with(prefix.as_str()))
            .map(|prefix| prefix.len())
            .filter(|&len| self.tokenizer.count(&text[..len]) <= budget)
    }

    /// Largest char boundary whose prefix fits, by binary search.
    ///
    /// Approximate when prefix counts are not monotonic; the result always fits.
    fn largest_fitting(&self, text: &str, budget: usize) -> Option<usize> {
        let candidates: Vec<usize> = text.char_indices().skip(1).map(|(i, _)| i).collect();
        let fits = |end: usize| self.tokenizer.count(&text[..end]) <= budget;

        // candidates[..lo] were seen to fit, candidates[hi..] not
        let (mut lo, mut hi) = (0, candidates.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if fits(candidates[mid]) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        lo.checked_sub(1).map(|i| candidates[i])
    }
}

/// Byte offsets where whitespace starts after a non-whitespace character.
fn word_ends(text: &str) -> Vec<usize> {
    let mut ends = Vec::new();
    let mut prev_is_space = true;
    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if is_space && !prev_is_space {
            ends.push(i);
        }
        prev_is_space = is_space;
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TiktokenTokenizer;

    const SENTENCE: &str = "This is a very long long text with many many words that produce a lengthy sentence that is the input for the splitter.";

    fn cutter() -> ChunkCutter {
        ChunkCutter::new(Arc::new(TiktokenTokenizer::cl100k().unwrap()))
    }

    #[test]
    fn test_cut_to_ten_tokens() {
        let cut = cutter().cut(SENTENCE, 10);
        assert_eq!(cut.kept, &SENTENCE[..44]);
        assert_eq!(cut.kept_tokens, 10);
        assert_eq!(format!("{}{}", cut.kept, cut.discarded), SENTENCE);
    }

    #[test]
    fn test_cut_to_twenty_tokens() {
        assert_eq!(cutter().cut_to_length(SENTENCE, 20), &SENTENCE[..100]);
    }

    #[test]
    fn test_every_budget_is_respected() {
        let cutter = cutter();
        for budget in 1..=25 {
            let cut = cutter.cut(SENTENCE, budget);
            assert!(cut.kept_tokens <= budget, "budget {budget}: {cut:?}");
            assert!(!cut.kept.is_empty());
            assert_eq!(format!("{}{}", cut.kept, cut.discarded), SENTENCE);
        }
    }

    #[test]
    fn test_link_with_parentheses_not_split() {
        let link = "[the docs](https://example.com/wiki/Rust_(language))";
        let text = format!("See {} for the rest of the story.", link);
        let cut = cutter().cut(&text, 8);

        assert!(cut.kept.ends_with(link), "{cut:?}");
        assert!(!cut.discarded.starts_with(')'));
        assert_eq!(format!("{}{}", cut.kept, cut.discarded), text);
    }

    #[test]
    fn test_no_cut_when_fits() {
        let cut = cutter().cut(SENTENCE, 100);
        assert_eq!(cut.kept, SENTENCE);
        assert!(cut.discarded.is_empty());
        assert!(!cut.is_truncated());
    }

    #[test]
    fn test_url_is_not_split() {
        let url = "https://example.com/some/very/long/path/with/many/segments/index.html";
        let text = format!("Read more at {} for details.", url);
        let cut = cutter().cut(&text, 6);

        assert!(cut.kept.ends_with(url));
        assert!(cut.kept_tokens > 6);
        assert_eq!(format!("{}{}", cut.kept, cut.discarded), text);
    }

    #[test]
    fn test_single_long_word_uses_char_boundaries() {
        let word = "ü".repeat(50);
        let cut = cutter().cut(&word, 5);
        assert!(!cut.kept.is_empty());
        assert!(cut.kept_tokens <= 5);
        assert_eq!(format!("{}{}", cut.kept, cut.discarded), word);
    }

    #[test]
    fn test_zero_budget_keeps_first_word() {
        let cut = cutter().cut("alpha beta gamma", 0);
        assert_eq!(cut.kept, "alpha");
        assert_eq!(cut.discarded, " beta gamma");
    }

    #[test]
    fn test_word_ends() {
        assert_eq!(word_ends("  ab  c d"), vec![4, 7]);
        assert!(word_ends("").is_empty());
    }
}
