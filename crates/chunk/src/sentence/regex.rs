//! Heuristic sentence splitter.
//!
//! Splits after `.`, `!`, `?` or `…` (plus trailing closing quotes/brackets)
//! when the next word looks like a sentence start: whitespace, an optional
//! opening quote/bracket, then an upper-case ASCII letter or digit. False
//! positives are merged back when the preceding piece ends with a known
//! abbreviation, initials, a dotted acronym, a decimal, an ellipsis or an
//! ordinal such as `No. 5`.

use super::SentenceSplitter;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Abbreviations that do not end a sentence, lower-case and without the final dot.
pub const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "sir", "madam", "st", "a.m", "p.m", "etc", "e.g",
    "i.e", "vs", "cf", "al", "ca", "resp", "jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep",
    "sept", "oct", "nov", "dec", "no", "dept", "fig", "eq", "inc", "ltd", "v",
];

const TERMINATORS: &[char] = &['.', '!', '?', '…'];
const CLOSERS: &[char] = &['\'', '"', ')', ']', '’', '”'];
const OPENERS: &[char] = &['“', '"', '\'', '(', '[', '‘'];

static NEWLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("valid newline pattern"));

static TRAILING_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^\W\d_]+)\.\s*$").expect("valid trailing word pattern"));

/// Endings that make a piece continue into the next one.
static MERGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // initials: "A. B."
        r"(?:\b[A-Z]\.){1,3}\s*$",
        // dotted acronym: "U.S."
        r"(?:\b[A-Z]\.){2,}\s*$",
        // decimal: "3.14"
        r"\d\.\d+\s*$",
        r"\.\.\.\s*$",
        // ordinal: "No. 5"
        r"(?i)\bNo\.\s*\d+\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid merge pattern"))
    .collect()
});

/// Sentence splitter based on punctuation heuristics.
#[derive(Debug, Clone)]
pub struct RegexSentenceSplitter {
    abbreviations: HashSet<String>,
}

impl Default for RegexSentenceSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexSentenceSplitter {
    /// Splitter with the default abbreviation set.
    pub fn new() -> Self {
        Self::with_abbreviations(DEFAULT_ABBREVIATIONS.iter().copied())
    }

    /// Splitter with a custom abbreviation set.
    ///
    /// Entries are compared case-insensitively; a trailing dot is ignored.
    pub fn with_abbreviations<I, S>(abbreviations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut splitter = Self {
            abbreviations: HashSet::new(),
        };
        splitter.extend_abbreviations(abbreviations);
        splitter
    }

    /// Add abbreviations to the set.
    pub fn extend_abbreviations<I, S>(&mut self, abbreviations: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.abbreviations.extend(
            abbreviations
                .into_iter()
                .map(|a| a.as_ref().trim().trim_end_matches('.').to_lowercase())
                .filter(|a| !a.is_empty()),
        );
    }

    pub fn abbreviations(&self) -> &HashSet<String> {
        &self.abbreviations
    }

    fn ends_with_abbreviation(&self, piece: &str) -> bool {
        TRAILING_WORD_RE
            .captures(piece)
            .and_then(|caps| caps.get(1))
            .map(|word| self.abbreviations.contains(&word.as_str().to_lowercase()))
            .unwrap_or(false)
    }

    fn should_merge_with_next(&self, piece: &str) -> bool {
        let piece = piece.trim_end();
        self.ends_with_abbreviation(piece) || MERGE_PATTERNS.iter().any(|re| re.is_match(piece))
    }
}

/// Byte offsets where a new sentence may begin.
fn candidate_boundaries(text: &str) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !TERMINATORS.contains(&c) {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if CLOSERS.contains(&next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let rest = &text[end..];
        let after_space = rest.trim_start();
        if after_space.len() == rest.len() {
            continue;
        }

        let mut upcoming = after_space.chars();
        let starter = match upcoming.next() {
            Some(c) if OPENERS.contains(&c) => upcoming.next(),
            other => other,
        };
        if matches!(starter, Some(c) if c.is_ascii_uppercase() || c.is_ascii_digit()) {
            boundaries.push(end);
        }
    }

    boundaries
}

impl SentenceSplitter for RegexSentenceSplitter {
    fn name(&self) -> &str {
        "regex"
    }

    fn get_sentences(&self, text: &str) -> Vec<String> {
        let normalized = NEWLINE_RE.replace_all(text.trim(), " ");
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut sentences: Vec<String> = Vec::new();
        let mut start = 0;
        let mut ends = candidate_boundaries(&normalized);
        ends.push(normalized.len());

        for end in ends {
            let part = &normalized[start..end];
            start = end;
            if part.is_empty() {
                continue;
            }

            match sentences.last_mut() {
                Some(last) if self.should_merge_with_next(last) => {
                    let merged = format!("{} {}", last.trim_end(), part.trim_start());
                    *last = merged;
                }
                _ => sentences.push(part.to_string()),
            }
        }

        sentences
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
