//! Tokens command handler.

use super::read_input;
use clap::Args;
use mdsplit_chunk::{tokenizer, ModelStore};
use mdsplit_core::{AppConfig, AppResult};
use std::path::PathBuf;

/// Count tokens in a text
#[derive(Args, Debug)]
pub struct TokensCommand {
    /// Text to tokenize
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Also print the token ids
    #[arg(long)]
    pub ids: bool,
}

impl TokensCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let text = read_input(self.text.as_deref(), self.file.as_ref())?;

        let store = ModelStore::from_settings(&config.models);
        let tokenizer = tokenizer::from_name(&config.splitter.tokenizer_model, &store)?;
        tracing::debug!("Counting tokens with {}", tokenizer.name());

        let ids = tokenizer.encode(&text);
        println!("{}", ids.len());
        if self.ids {
            let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
            println!("{}", ids.join(" "));
        }

        Ok(())
    }
}
