//! Local model cache for tokenizer and sentence splitter assets.
//!
//! Providers look up their files under `model_dir`. When a remote base URL is
//! configured and a file is missing, it is downloaded once and cached. Nothing
//! here runs during splitting; only provider construction touches the store.

use mdsplit_core::{AppError, AppResult, ModelSettings};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Download timeout in seconds
const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Resolves model files on disk and fetches missing ones.
#[derive(Debug, Clone, Default)]
pub struct ModelStore {
    root: PathBuf,
    sentence_model_url: Option<String>,
    tokenizer_hub_url: Option<String>,
}

impl ModelStore {
    /// Store rooted at `root` with downloads disabled.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sentence_model_url: None,
            tokenizer_hub_url: None,
        }
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            root: settings.model_dir.clone(),
            sentence_model_url: settings.sentence_model_url.clone(),
            tokenizer_hub_url: settings.tokenizer_hub_url.clone(),
        }
    }

    pub fn with_sentence_model_url(mut self, url: impl Into<String>) -> Self {
        self.sentence_model_url = Some(url.into());
        self
    }

    pub fn with_tokenizer_hub_url(mut self, url: impl Into<String>) -> Self {
        self.tokenizer_hub_url = Some(url.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a sentence model parameter file.
    pub fn sentence_model_path(&self, name: &str) -> PathBuf {
        self.root.join("sentence").join(format!("{}.json", name))
    }

    /// Path of a Hugging Face `tokenizer.json` for `name`.
    pub fn tokenizer_path(&self, name: &str) -> PathBuf {
        self.root.join(name).join("tokenizer.json")
    }

    /// Local sentence model file, downloading it when a repository is configured.
    ///
    /// Returns `Ok(None)` when the file is absent and no repository is set.
    pub fn fetch_sentence_model(&self, name: &str) -> AppResult<Option<PathBuf>> {
        let path = self.sentence_model_path(name);
        if path.is_file() {
            return Ok(Some(path));
        }
        match &self.sentence_model_url {
            Some(base) => {
                let url = format!("{}/{}.json", base.trim_end_matches('/'), name);
                download(&url, &path)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }

    /// Local tokenizer file, downloading it when a hub is configured.
    ///
    /// Returns `Ok(None)` when the file is absent and no hub is set.
    pub fn fetch_tokenizer(&self, name: &str) -> AppResult<Option<PathBuf>> {
        let path = self.tokenizer_path(name);
        if path.is_file() {
            return Ok(Some(path));
        }
        match &self.tokenizer_hub_url {
            Some(hub) => {
                let url = format!(
                    "{}/{}/resolve/main/tokenizer.json",
                    hub.trim_end_matches('/'),
                    name
                );
                download(&url, &path)?;
                Ok(Some(path))
            }
            None => Ok(None),
        }
    }
}

/// Fetch `url` into `dest`, creating parent directories.
fn download(url: &str, dest: &Path) -> AppResult<()> {
    info!("Downloading model file {} -> {:?}", url, dest);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Other(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| AppError::Other(format!("Failed to download {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Other(format!(
            "Failed to download {}: HTTP {}",
            url, status
        )));
    }

    let bytes = response
        .bytes()
        .map_err(|e| AppError::Other(format!("Failed to read body of {}: {}", url, e)))?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Write to a sibling temp file so a partial download never looks complete
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &bytes)?;
    std::fs::rename(&partial, dest)?;

    debug!("Stored {} bytes at {:?}", bytes.len(), dest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_paths() {
        let store = ModelStore::new("/models");
        assert_eq!(
            store.sentence_model_path("de"),
            PathBuf::from("/models/sentence/de.json")
        );
        assert_eq!(
            store.tokenizer_path("bert-base-uncased"),
            PathBuf::from("/models/bert-base-uncased/tokenizer.json")
        );
    }

    #[test]
    fn test_missing_without_remote() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path());
        assert!(store.fetch_sentence_model("de").unwrap().is_none());
        assert!(store.fetch_tokenizer("bert").unwrap().is_none());
    }

    #[test]
    fn test_existing_file_is_used() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path()).with_sentence_model_url("http://127.0.0.1:9");
        let path = store.sentence_model_path("hr");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();

        // The configured URL is never contacted for a cached file
        assert_eq!(store.fetch_sentence_model("hr").unwrap(), Some(path));
    }

    #[test]
    fn test_from_settings() {
        let settings = ModelSettings {
            model_dir: PathBuf::from("cache"),
            sentence_model_url: Some("https://models.example".to_string()),
            tokenizer_hub_url: None,
        };
        let store = ModelStore::from_settings(&settings);
        assert_eq!(store.root(), Path::new("cache"));
        assert!(store.fetch_tokenizer("absent-model-name").unwrap().is_none());
    }
}
