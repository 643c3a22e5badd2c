//! BPE tokenizers from the embedded tiktoken tables.

use super::Tokenizer;
use mdsplit_core::{AppError, AppResult};
use tiktoken_rs::CoreBPE;

/// Encoding names accepted directly.
const ENCODINGS: &[&str] = &["cl100k_base", "o200k_base", "p50k_base", "p50k_edit", "r50k_base"];

/// Tokenizer backed by a tiktoken encoding.
pub struct TiktokenTokenizer {
    name: String,
    bpe: CoreBPE,
}

impl std::fmt::Debug for TiktokenTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenTokenizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TiktokenTokenizer {
    /// Encoding used by an OpenAI model name, if the model is known.
    pub fn for_model(model: &str) -> Option<Self> {
        tiktoken_rs::get_bpe_from_model(model).ok().map(|bpe| Self {
            name: model.to_string(),
            bpe,
        })
    }

    /// Encoding by its own name; `Ok(None)` if the name is not an encoding.
    pub fn for_encoding(encoding: &str) -> AppResult<Option<Self>> {
        if !ENCODINGS.contains(&encoding) {
            return Ok(None);
        }

        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "p50k_edit" => tiktoken_rs::p50k_edit(),
            _ => tiktoken_rs::r50k_base(),
        }
        .map_err(|e| AppError::tokenizer_not_found(encoding, e.to_string()))?;

        Ok(Some(Self {
            name: encoding.to_string(),
            bpe,
        }))
    }

    /// The `cl100k_base` encoding.
    pub fn cl100k() -> AppResult<Self> {
        Self::for_encoding("cl100k_base")?
            .ok_or_else(|| AppError::tokenizer_not_found("cl100k_base", "encoding unavailable"))
    }
}

impl Tokenizer for TiktokenTokenizer {
    fn name(&self) -> &str {
        &self.name
    }

    fn encode(&self, text: &str) -> Vec<u32> {
        // Special-token markers in documents are plain text
        self.bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|id| id as u32)
            .collect()
    }

    fn decode(&self, ids: &[u32]) -> AppResult<String> {
        self.bpe
            .decode(ids.iter().map(|&id| id as _).collect())
            .map_err(|e| AppError::Other(format!("Failed to decode tokens: {}", e)))
    }
}
