//! mdsplit core library
//!
//! Foundational utilities shared by the chunking engine and the CLI:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Settings loading and validation

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, ModelSettings, SettingsOverrides, SplitterSettings};
pub use error::{AppError, AppResult, ProviderKind};
