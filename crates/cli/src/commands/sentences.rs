//! Sentences command handler.

use super::read_input;
use clap::Args;
use mdsplit_chunk::{ModelStore, SentenceSplitterRegistry};
use mdsplit_core::{AppConfig, AppResult};
use std::path::PathBuf;

/// Split a text into sentences, one per line
#[derive(Args, Debug)]
pub struct SentencesCommand {
    /// Text to split
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl SentencesCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let text = read_input(self.text.as_deref(), self.file.as_ref())?;

        let store = ModelStore::from_settings(&config.models);
        let splitter = SentenceSplitterRegistry::new()
            .with_abbreviations(
                config.splitter.abbreviations.clone(),
                config.splitter.extra_abbreviations.clone(),
            )
            .from_name(&config.splitter.sentence_splitter_model, &store)?;
        tracing::debug!("Splitting sentences with {}", splitter.name());

        for sentence in splitter.get_sentences(&text) {
            println!("{}", sentence);
        }

        Ok(())
    }
}
