//! Configuration management for mdsplit.
//!
//! Settings are merged from several sources, later ones winning:
//! - Built-in defaults
//! - A YAML config file (`MDSPLIT_CONFIG` or `.mdsplit/config.yaml`)
//! - Environment variables (`MDSPLIT_*`, `RUST_LOG`, `NO_COLOR`)
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".mdsplit/config.yaml";

/// Token budget and provider selection for the chunking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitterSettings {
    /// Nominal token limit per chunk
    #[serde(default = "default_token_count_max")]
    pub token_count_max: usize,

    /// Amount a chunk may exceed `token_count_max` before it is oversized
    #[serde(default = "default_token_count_buffer")]
    pub token_count_buffer: usize,

    /// Minimum tokens for a standalone chunk
    #[serde(default = "default_token_count_min")]
    pub token_count_min: usize,

    /// Tokenizer model or encoding name (e.g., "gpt-3.5-turbo", "cl100k_base")
    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,

    /// Sentence splitter name ("regex", "unicode", or a model name)
    #[serde(default = "default_sentence_splitter_model")]
    pub sentence_splitter_model: String,

    /// Replaces the regex splitter's built-in abbreviation set
    #[serde(default)]
    pub abbreviations: Option<Vec<String>>,

    /// Added to the regex splitter's abbreviation set
    #[serde(default)]
    pub extra_abbreviations: Vec<String>,

    /// Drop the tail of a cut span instead of chunking it further
    #[serde(default)]
    pub discard_cut_remainder: bool,

    /// Prefix chunks with their ancestor headings and drop heading-only chunks
    #[serde(default = "default_heading_breadcrumbs")]
    pub heading_breadcrumbs: bool,
}

fn default_token_count_max() -> usize {
    1024
}

fn default_token_count_buffer() -> usize {
    32
}

fn default_token_count_min() -> usize {
    64
}

fn default_tokenizer_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_sentence_splitter_model() -> String {
    "regex".to_string()
}

fn default_heading_breadcrumbs() -> bool {
    true
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            token_count_max: default_token_count_max(),
            token_count_buffer: default_token_count_buffer(),
            token_count_min: default_token_count_min(),
            tokenizer_model: default_tokenizer_model(),
            sentence_splitter_model: default_sentence_splitter_model(),
            abbreviations: None,
            extra_abbreviations: Vec::new(),
            discard_cut_remainder: false,
            heading_breadcrumbs: default_heading_breadcrumbs(),
        }
    }
}

impl SplitterSettings {
    /// Check the token-limit relationships.
    pub fn validate(&self) -> AppResult<()> {
        if self.token_count_max == 0 {
            return Err(AppError::Config(
                "token_count_max must be greater than 0".to_string(),
            ));
        }
        if self.token_count_min == 0 {
            return Err(AppError::Config(
                "token_count_min must be greater than 0".to_string(),
            ));
        }
        if self.token_count_min > self.token_count_max {
            return Err(AppError::Config(format!(
                "token_count_min ({}) must not exceed token_count_max ({})",
                self.token_count_min, self.token_count_max
            )));
        }
        if self.tokenizer_model.trim().is_empty() {
            return Err(AppError::Config("tokenizer_model must not be empty".to_string()));
        }
        if self.sentence_splitter_model.trim().is_empty() {
            return Err(AppError::Config(
                "sentence_splitter_model must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where provider model assets live and where they may be fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Local model cache directory
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Base URL serving `<name>.json` sentence models
    #[serde(default)]
    pub sentence_model_url: Option<String>,

    /// Base URL of a Hugging Face compatible hub for `tokenizer.json` files
    #[serde(default)]
    pub tokenizer_hub_url: Option<String>,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(".mdsplit/models")
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            sentence_model_url: None,
            tokenizer_hub_url: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    splitter: Option<SplitterSettings>,
    models: Option<ModelSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

/// Command-line overrides; `None` leaves the loaded value untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
    pub token_count_max: Option<usize>,
    pub token_count_buffer: Option<usize>,
    pub token_count_min: Option<usize>,
    pub tokenizer_model: Option<String>,
    pub sentence_splitter_model: Option<String>,
    pub model_dir: Option<PathBuf>,
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Chunking engine settings
    pub splitter: SplitterSettings,

    /// Provider model locations
    pub models: ModelSettings,
}

impl AppConfig {
    /// Load configuration from the config file and the process environment.
    ///
    /// Environment variables:
    /// - `MDSPLIT_CONFIG`: Path to config file
    /// - `MDSPLIT_TOKEN_COUNT_MAX`, `MDSPLIT_TOKEN_COUNT_BUFFER`, `MDSPLIT_TOKEN_COUNT_MIN`
    /// - `MDSPLIT_TOKENIZER_MODEL`, `MDSPLIT_SENTENCE_SPLITTER_MODEL`
    /// - `MDSPLIT_MODEL_DIR`, `MDSPLIT_SENTENCE_MODEL_URL`, `MDSPLIT_TOKENIZER_HUB_URL`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let config_file = std::env::var("MDSPLIT_CONFIG").ok().map(PathBuf::from);
        Self::load_with(config_file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load from an explicit config file and an environment lookup.
    ///
    /// Without an explicit file, `.mdsplit/config.yaml` is merged when present.
    pub fn load_with<F>(config_file: Option<&Path>, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config.merge_yaml(path)?;
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    config.merge_yaml(default_path)?;
                }
            }
        }

        config.apply_env(env)?;

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(splitter) = config_file.splitter {
            self.splitter = splitter;
        }

        if let Some(models) = config_file.models {
            self.models = models;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        self.config_file = Some(path.to_path_buf());
        tracing::debug!("Merged config file {:?}", path);

        Ok(())
    }

    /// Apply environment variables on top of file settings.
    fn apply_env<F>(&mut self, env: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("MDSPLIT_TOKEN_COUNT_MAX") {
            self.splitter.token_count_max = parse_count("MDSPLIT_TOKEN_COUNT_MAX", &value)?;
        }
        if let Some(value) = env("MDSPLIT_TOKEN_COUNT_BUFFER") {
            self.splitter.token_count_buffer =
                parse_count("MDSPLIT_TOKEN_COUNT_BUFFER", &value)?;
        }
        if let Some(value) = env("MDSPLIT_TOKEN_COUNT_MIN") {
            self.splitter.token_count_min = parse_count("MDSPLIT_TOKEN_COUNT_MIN", &value)?;
        }
        if let Some(value) = env("MDSPLIT_TOKENIZER_MODEL") {
            self.splitter.tokenizer_model = value;
        }
        if let Some(value) = env("MDSPLIT_SENTENCE_SPLITTER_MODEL") {
            self.splitter.sentence_splitter_model = value;
        }
        if let Some(value) = env("MDSPLIT_MODEL_DIR") {
            self.models.model_dir = PathBuf::from(value);
        }
        if let Some(value) = env("MDSPLIT_SENTENCE_MODEL_URL") {
            self.models.sentence_model_url = Some(value);
        }
        if let Some(value) = env("MDSPLIT_TOKENIZER_HUB_URL") {
            self.models.tokenizer_hub_url = Some(value);
        }
        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }
        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }
        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the file and the environment.
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        if let Some(max) = overrides.token_count_max {
            self.splitter.token_count_max = max;
        }
        if let Some(buffer) = overrides.token_count_buffer {
            self.splitter.token_count_buffer = buffer;
        }
        if let Some(min) = overrides.token_count_min {
            self.splitter.token_count_min = min;
        }
        if let Some(tokenizer) = overrides.tokenizer_model {
            self.splitter.tokenizer_model = tokenizer;
        }
        if let Some(splitter) = overrides.sentence_splitter_model {
            self.splitter.sentence_splitter_model = splitter;
        }
        if let Some(model_dir) = overrides.model_dir {
            self.models.model_dir = model_dir;
        }

        self
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        self.splitter.validate()
    }
}

fn parse_count(key: &str, value: &str) -> AppResult<usize> {
    value.trim().parse::<usize>().map_err(|e| {
        AppError::Config(format!("{} must be a non-negative integer, got '{}': {}", key, value, e))
    })
}
