//! Command handlers for the mdsplit CLI.

pub mod sentences;
pub mod split;
pub mod tokens;

pub use sentences::SentencesCommand;
pub use split::SplitCommand;
pub use tokens::TokensCommand;

use mdsplit_core::{AppError, AppResult};
use std::path::PathBuf;

/// Text given inline or read from a file.
pub(crate) fn read_input(text: Option<&str>, file: Option<&PathBuf>) -> AppResult<String> {
    match (text, file) {
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?),
        (Some(_), Some(_)) => Err(AppError::Other(
            "Pass either TEXT or --file, not both".to_string(),
        )),
        (None, None) => Err(AppError::Other("Pass TEXT or --file".to_string())),
    }
}
