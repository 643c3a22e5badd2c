//! Sentence splitter trait, implementations and name-based factory.
//!
//! Names resolve as follows:
//! - `"regex"`: punctuation heuristics with a configurable abbreviation set
//! - `"unicode"`: UAX #29 sentence boundaries
//! - a name starting with a registered family prefix (e.g. `"sat-"`): the
//!   constructor registered for that family
//! - a name in a known learned family with no registered constructor: an error
//! - anything else: a statistical model file `<model_dir>/sentence/<name>.json`

mod punkt;
mod regex;
mod unicode;

pub use self::regex::{RegexSentenceSplitter, DEFAULT_ABBREVIATIONS};
pub use punkt::{PunktParameters, PunktSentenceSplitter};
pub use unicode::UnicodeSentenceSplitter;

use crate::models::ModelStore;
use mdsplit_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for sentence boundary detection.
pub trait SentenceSplitter: Send + Sync + std::fmt::Debug {
    /// Name the splitter was resolved from
    fn name(&self) -> &str;

    /// Split text into trimmed, non-empty sentences.
    fn get_sentences(&self, text: &str) -> Vec<String>;
}

/// Prefixes of learned segmentation model families (Segment any Text, WtP).
pub const LEARNED_FAMILIES: &[&str] = &["sat-", "wtp-"];

/// Constructor for a family of learned sentence splitters.
pub type SentenceSplitterFactory =
    Arc<dyn Fn(&str, &ModelStore) -> AppResult<Arc<dyn SentenceSplitter>> + Send + Sync>;

/// Resolves sentence splitter names to implementations.
#[derive(Clone, Default)]
pub struct SentenceSplitterRegistry {
    families: Vec<(String, SentenceSplitterFactory)>,
    abbreviations: Option<Vec<String>>,
    extra_abbreviations: Vec<String>,
}

impl std::fmt::Debug for SentenceSplitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let families: Vec<&str> = self.families.iter().map(|(p, _)| p.as_str()).collect();
        f.debug_struct("SentenceSplitterRegistry")
            .field("families", &families)
            .field("abbreviations", &self.abbreviations)
            .field("extra_abbreviations", &self.extra_abbreviations)
            .finish()
    }
}

impl SentenceSplitterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route names starting with `prefix` to `factory`.
    pub fn register_family<F>(&mut self, prefix: impl Into<String>, factory: F)
    where
        F: Fn(&str, &ModelStore) -> AppResult<Arc<dyn SentenceSplitter>> + Send + Sync + 'static,
    {
        self.families.push((prefix.into(), Arc::new(factory)));
    }

    /// Abbreviation set for the regex splitter.
    ///
    /// `replace` swaps out the default set; `extra` is added on top.
    pub fn with_abbreviations(mut self, replace: Option<Vec<String>>, extra: Vec<String>) -> Self {
        self.abbreviations = replace;
        self.extra_abbreviations = extra;
        self
    }

    fn regex_splitter(&self) -> RegexSentenceSplitter {
        let mut splitter = match &self.abbreviations {
            Some(set) => RegexSentenceSplitter::with_abbreviations(set),
            None => RegexSentenceSplitter::new(),
        };
        splitter.extend_abbreviations(&self.extra_abbreviations);
        splitter
    }

    /// Create the sentence splitter called `name`.
    pub fn from_name(&self, name: &str, store: &ModelStore) -> AppResult<Arc<dyn SentenceSplitter>> {
        match name {
            "regex" => return Ok(Arc::new(self.regex_splitter())),
            "unicode" => return Ok(Arc::new(UnicodeSentenceSplitter)),
            _ => {}
        }

        if let Some((prefix, factory)) = self
            .families
            .iter()
            .find(|(prefix, _)| name.starts_with(prefix.as_str()))
        {
            tracing::debug!("Sentence splitter '{}' handled by family '{}'", name, prefix);
            return factory(name, store);
        }

        if let Some(prefix) = LEARNED_FAMILIES.iter().find(|p| name.starts_with(*p)) {
            return Err(AppError::sentence_splitter_not_found(
                name,
                format!(
                    "no backend registered for learned model family '{}'; \
                     register one with SentenceSplitterRegistry::register_family",
                    prefix
                ),
            ));
        }

        match store.fetch_sentence_model(name) {
            Ok(Some(path)) => Ok(Arc::new(PunktSentenceSplitter::from_file(name, &path)?)),
            Ok(None) => Err(AppError::sentence_splitter_not_found(
                name,
                format!(
                    "no registered backend and no model file at {:?}",
                    store.sentence_model_path(name)
                ),
            )),
            Err(e) => Err(AppError::sentence_splitter_not_found(name, e.to_string())),
        }
    }
}

/// Create a sentence splitter with the default registry.
pub fn from_name(name: &str, store: &ModelStore) -> AppResult<Arc<dyn SentenceSplitter>> {
    SentenceSplitterRegistry::new().from_name(name, store)
}
