//! Hugging Face `tokenizer.json` tokenizers.

use super::Tokenizer;
use mdsplit_core::{AppError, AppResult};
use std::path::Path;

/// Text with words no vocabulary is expected to contain.
const ENCODE_CHECK_TEXT: &str = "Zqxjv wvkq \u{2603} 0x7f3a";

/// Tokenizer loaded from a Hugging Face `tokenizer.json` file.
pub struct HuggingFaceTokenizer {
    name: String,
    inner: tokenizers::Tokenizer,
}

impl std::fmt::Debug for HuggingFaceTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceTokenizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl HuggingFaceTokenizer {
    pub fn from_file(name: &str, path: &Path) -> AppResult<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            AppError::tokenizer_not_found(name, format!("failed to load {:?}: {}", path, e))
        })?;

        // A model without a usable unknown token fails on unseen words
        inner.encode(ENCODE_CHECK_TEXT, false).map_err(|e| {
            AppError::tokenizer_not_found(
                name,
                format!("{:?} cannot encode arbitrary text: {}", path, e),
            )
        })?;

        tracing::debug!("Loaded Hugging Face tokenizer '{}' from {:?}", name, path);

        Ok(Self {
            name: name.to_string(),
            inner,
        })
    }
}

impl Tokenizer for HuggingFaceTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        match self.inner.encode(text, false) {
            Ok(encoding) => encoding.get_ids().to_vec(),
            Err(e) => {
                tracing::warn!("Tokenizer '{}' failed to encode text: {}", self.name, e);
                Vec::new()
            }
        }
    }

    /// Falls back to the character count when encoding fails, so the text is
    /// never treated as empty.
    fn count(&self, text: &str) -> usize {
        match self.inner.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                tracing::warn!(
                    "Tokenizer '{}' failed to encode text, counting characters: {}",
                    self.name,
                    e
                );
                text.chars().count()
            }
        }
    }

    fn decode(&self, ids: &[u32]) -> AppResult<String> {
        self.inner
            .decode(ids, false)
            .map_err(|e| AppError::Other(format!("Failed to decode tokens: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Minimal word-level tokenizer splitting on whitespace.
    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": {"type": "Whitespace"},
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": {"[UNK]": 0, "hello": 1, "world": 2},
            "unk_token": "[UNK]"
        }
    }"#;

    #[test]
    fn test_load_and_encode() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL).unwrap();

        let tokenizer = HuggingFaceTokenizer::from_file("word-level", &path).unwrap();
        assert_eq!(tokenizer.name(), "word-level");
        assert_eq!(tokenizer.encode("hello world"), vec![1, 2]);
        assert_eq!(tokenizer.encode("hello there"), vec![1, 0]);
        assert_eq!(tokenizer.count("world world world"), 3);
    }

    #[test]
    fn test_vocab_without_unknown_token_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL.replace(r#""[UNK]": 0, "#, "")).unwrap();

        let result = HuggingFaceTokenizer::from_file("no-unk", &path);
        assert!(matches!(result, Err(AppError::ProviderNotFound { .. })));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = HuggingFaceTokenizer::from_file("x", &temp.path().join("nope.json"));
        assert!(matches!(result, Err(AppError::ProviderNotFound { .. })));
    }
}
