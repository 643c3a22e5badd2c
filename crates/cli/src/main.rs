//! mdsplit CLI
//!
//! Main entry point for the mdsplit command-line tool.
//! Splits Markdown documents into token-bounded chunks.

mod commands;

use clap::{Parser, Subcommand};
use commands::{SentencesCommand, SplitCommand, TokensCommand};
use mdsplit_core::{logging, AppConfig, AppResult, SettingsOverrides};
use std::path::PathBuf;

/// mdsplit - structure-aware Markdown chunking
#[derive(Parser, Debug)]
#[command(name = "mdsplit")]
#[command(about = "Split Markdown into token-bounded chunks", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MDSPLIT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Nominal maximum tokens per chunk
    #[arg(long, global = true)]
    token_limit: Option<usize>,

    /// Tolerance above the token limit
    #[arg(long, global = true)]
    token_buffer: Option<usize>,

    /// Minimum tokens per chunk
    #[arg(long, global = true)]
    token_min: Option<usize>,

    /// Tokenizer model or encoding name
    #[arg(short, long, global = true)]
    tokenizer: Option<String>,

    /// Sentence splitter name (regex, unicode, or a model name)
    #[arg(short, long, global = true)]
    sentence_splitter: Option<String>,

    /// Directory for downloaded tokenizer and sentence models
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split Markdown files into JSON chunks
    Split(SplitCommand),

    /// Count tokens in a text
    Tokens(TokensCommand),

    /// Split a text into sentences
    Sentences(SentencesCommand),
}

fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.config.as_deref(), |key| std::env::var(key).ok())?;

    // Apply CLI overrides
    let config = config.with_overrides(SettingsOverrides {
        config_file: cli.config,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
        token_count_max: cli.token_limit,
        token_count_buffer: cli.token_buffer,
        token_count_min: cli.token_min,
        tokenizer_model: cli.tokenizer,
        sentence_splitter_model: cli.sentence_splitter,
        model_dir: cli.model_dir,
    });

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::debug!("Config file: {:?}", config.config_file);
    tracing::debug!("Splitter settings: {:?}", config.splitter);

    let command_name = match &cli.command {
        Commands::Split(_) => "split",
        Commands::Tokens(_) => "tokens",
        Commands::Sentences(_) => "sentences",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Split(cmd) => cmd.execute(&config),
        Commands::Tokens(cmd) => cmd.execute(&config),
        Commands::Sentences(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
