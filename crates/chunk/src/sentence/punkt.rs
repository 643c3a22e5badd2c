//! Statistical sentence splitter driven by Punkt-style parameters.
//!
//! The parameters are learned offline and stored as JSON:
//!
//! ```json
//! {
//!   "abbrev_types": ["dr", "bzw", "z.b"],
//!   "collocations": [["##number##", "mai"]],
//!   "sent_starters": ["der", "die"],
//!   "lowercase_starters": false
//! }
//! ```
//!
//! A token ending in `?`, `!` or `…` ends a sentence. A token ending in `.`
//! ends a sentence unless it is a known abbreviation, an initial, or forms a
//! collocation with the next word. Abbreviations and initials still break when
//! the next word is a frequent sentence starter. A break is suppressed when the
//! next word starts lower-case, unless lower-case starters are allowed.

use super::SentenceSplitter;
use mdsplit_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Type used for numeric tokens in collocations.
const NUMBER_TYPE: &str = "##number##";

const CLOSERS: &[char] = &['\'', '"', ')', ']', '’', '”', '»'];
const OPENERS: &[char] = &['“', '"', '\'', '(', '[', '‘', '„', '«'];

/// Learned parameters of the splitter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PunktParameters {
    /// Abbreviation types, lower-case without the final dot
    #[serde(default)]
    pub abbrev_types: Vec<String>,

    /// Word pairs that span a period without a sentence break
    #[serde(default)]
    pub collocations: Vec<(String, String)>,

    /// Words that frequently start a sentence
    #[serde(default)]
    pub sent_starters: Vec<String>,

    /// Whether sentences may start with a lower-case word
    #[serde(default)]
    pub lowercase_starters: bool,
}

/// Sentence splitter using [`PunktParameters`].
#[derive(Debug, Clone)]
pub struct PunktSentenceSplitter {
    name: String,
    abbrev_types: HashSet<String>,
    collocations: HashSet<(String, String)>,
    sent_starters: HashSet<String>,
    lowercase_starters: bool,
}

impl PunktSentenceSplitter {
    pub fn new(name: impl Into<String>, params: PunktParameters) -> Self {
        let lower = |s: String| s.to_lowercase();
        Self {
            name: name.into(),
            abbrev_types: params.abbrev_types.into_iter().map(lower).collect(),
            collocations: params
                .collocations
                .into_iter()
                .map(|(a, b)| (a.to_lowercase(), b.to_lowercase()))
                .collect(),
            sent_starters: params.sent_starters.into_iter().map(lower).collect(),
            lowercase_starters: params.lowercase_starters,
        }
    }

    /// Load parameters from a JSON file.
    pub fn from_file(name: &str, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::sentence_splitter_not_found(name, format!("failed to read {:?}: {}", path, e))
        })?;
        let params: PunktParameters = serde_json::from_str(&contents).map_err(|e| {
            AppError::sentence_splitter_not_found(
                name,
                format!("invalid model file {:?}: {}", path, e),
            )
        })?;

        tracing::debug!(
            "Loaded sentence model '{}' ({} abbreviations, {} collocations)",
            name,
            params.abbrev_types.len(),
            params.collocations.len()
        );

        Ok(Self::new(name, params))
    }

    fn is_break(&self, token: &str, next: &str) -> bool {
        let core = token.trim_end_matches(CLOSERS);
        let next_word = next.trim_start_matches(OPENERS);
        let next_type = word_type(next_word);

        let starts_lower = next_word.chars().next().is_some_and(char::is_lowercase);
        if starts_lower && !self.lowercase_starters {
            return false;
        }

        if core.ends_with(['?', '!', '…']) {
            return true;
        }

        let Some(stem) = core.strip_suffix('.') else {
            return false;
        };
        if stem.ends_with("..") {
            // Ellipsis: break only before a clear sentence start
            return starts_upper(next_word) || self.sent_starters.contains(&next_type);
        }

        let typ = word_type(stem.trim_start_matches(OPENERS));
        if self.collocations.contains(&(typ.clone(), next_type.clone())) {
            return false;
        }

        let is_initial = {
            let mut chars = typ.chars();
            matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic())
        };
        if self.abbrev_types.contains(&typ) || is_initial {
            return self.sent_starters.contains(&next_type);
        }

        true
    }
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase() || c.is_numeric())
}

/// Lower-cased type of a word; numbers collapse to a single type.
fn word_type(word: &str) -> String {
    let word = word.trim_end_matches(|c: char| !c.is_alphanumeric());
    if !word.is_empty() && word.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        NUMBER_TYPE.to_string()
    } else {
        word.to_lowercase()
    }
}

impl SentenceSplitter for PunktSentenceSplitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_sentences(&self, text: &str) -> Vec<String> {
        // Whitespace-delimited tokens with their byte ranges
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in text.char_indices() {
            match (c.is_whitespace(), start) {
                (true, Some(s)) => {
                    tokens.push((s, i));
                    start = None;
                }
                (false, None) => start = Some(i),
                _ => {}
            }
        }
        if let Some(s) = start {
            tokens.push((s, text.len()));
        }

        let mut sentences = Vec::new();
        let mut sentence_start = 0;
        for pair in tokens.windows(2) {
            let (s, e) = pair[0];
            let (ns, ne) = pair[1];
            if self.is_break(&text[s..e], &text[ns..ne]) {
                sentences.push(text[sentence_start..e].trim().to_string());
                sentence_start = ns;
            }
        }
        sentences.push(text[sentence_start..].trim().to_string());

        sentences.retain(|s| !s.is_empty());
        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn german() -> PunktSentenceSplitter {
        PunktSentenceSplitter::new(
            "de",
            PunktParameters {
                abbrev_types: vec!["dr".into(), "bzw".into(), "z.b".into(), "ca".into()],
                collocations: vec![(NUMBER_TYPE.into(), "mai".into())],
                sent_starters: vec!["der".into(), "die".into()],
                lowercase_starters: false,
            },
        )
    }

    #[test]
    fn test_abbreviations_and_collocations() {
        let sentences = german().get_sentences(
            "Dr. Müller kam am 5. Mai an. Er brachte z.B. Äpfel mit. Die Kinder freuten sich!",
        );
        assert_eq!(
            sentences,
            vec![
                "Dr. Müller kam am 5. Mai an.",
                "Er brachte z.B. Äpfel mit.",
                "Die Kinder freuten sich!"
            ]
        );
    }

    #[test]
    fn test_abbreviation_before_sentence_starter() {
        let sentences = german().get_sentences("Es kostet ca. Die Hälfte bleibt.");
        assert_eq!(sentences, vec!["Es kostet ca.", "Die Hälfte bleibt."]);
    }

    #[test]
    fn test_lowercase_next_word() {
        let sentences = german().get_sentences("Das ist gut. und weiter geht es.");
        assert_eq!(sentences.len(), 1);
    }

    #[test]
    fn test_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hr.json");
        std::fs::write(
            &path,
            r#"{"abbrev_types": ["npr", "tj"], "sent_starters": ["to"]}"#,
        )
        .unwrap();

        let splitter = PunktSentenceSplitter::from_file("hr", &path).unwrap();
        assert_eq!(splitter.name(), "hr");
        assert_eq!(
            splitter.get_sentences("Voće, npr. Jabuke, je zdravo. Svi to znaju."),
            vec!["Voće, npr. Jabuke, je zdravo.", "Svi to znaju."]
        );
    }

    #[test]
    fn test_invalid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            PunktSentenceSplitter::from_file("bad", &path),
            Err(AppError::ProviderNotFound { .. })
        ));
    }
}
