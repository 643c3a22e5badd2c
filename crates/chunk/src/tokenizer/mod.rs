//! Tokenizer trait and factory.
//!
//! Tokenizers are resolved by name: OpenAI model names and tiktoken encoding
//! names use the embedded BPE tables, anything else is looked up as a
//! Hugging Face `tokenizer.json` through the [`ModelStore`].

mod huggingface;
mod tiktoken;

pub use huggingface::HuggingFaceTokenizer;
pub use tiktoken::TiktokenTokenizer;

use crate::models::ModelStore;
use mdsplit_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Trait for tokenizers used to measure and truncate text.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Name the tokenizer was resolved from
    fn name(&self) -> &str;

    /// Encode text into token ids.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode token ids back into text.
    fn decode(&self, ids: &[u32]) -> AppResult<String>;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// Create a tokenizer from a model, encoding or Hugging Face tokenizer name.
pub fn from_name(name: &str, store: &ModelStore) -> AppResult<Arc<dyn Tokenizer>> {
    if let Some(tokenizer) = TiktokenTokenizer::for_model(name) {
        tracing::debug!("Using tiktoken encoding for model '{}'", name);
        return Ok(Arc::new(tokenizer));
    }

    if let Some(tokenizer) = TiktokenTokenizer::for_encoding(name)? {
        tracing::debug!("Using tiktoken encoding '{}'", name);
        return Ok(Arc::new(tokenizer));
    }

    let direct = Path::new(name);
    if direct.is_file() {
        return Ok(Arc::new(HuggingFaceTokenizer::from_file(name, direct)?));
    }

    match store.fetch_tokenizer(name) {
        Ok(Some(path)) => Ok(Arc::new(HuggingFaceTokenizer::from_file(name, &path)?)),
        Ok(None) => Err(AppError::tokenizer_not_found(
            name,
            format!(
                "not a tiktoken model or encoding, and no tokenizer.json at {:?}",
                store.tokenizer_path(name)
            ),
        )),
        Err(e) => Err(AppError::tokenizer_not_found(name, e.to_string())),
    }
}
