//! Split command handler.
//!
//! Walks Markdown files and writes one JSON chunk per line.

use clap::Args;
use mdsplit_chunk::{Document, ModelStore, SemanticSplitter};
use mdsplit_core::{AppConfig, AppError, AppResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Split Markdown files into JSON chunks
#[derive(Args, Debug)]
pub struct SplitCommand {
    /// Files or directories to split
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Source URL stored on every chunk (default: the file path)
    #[arg(long)]
    pub url: Option<String>,

    /// Keywords stored on every chunk
    #[arg(long, default_value = "")]
    pub keywords: String,

    /// Write chunks to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also print truncation events to stderr
    #[arg(long)]
    pub report: bool,
}

impl SplitCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing split command for {} paths", self.paths.len());

        let store = ModelStore::from_settings(&config.models);
        let splitter = SemanticSplitter::from_settings(&config.splitter, &store)?;

        let files = collect_markdown_files(&self.paths);
        if files.is_empty() {
            return Err(AppError::Other(format!(
                "No Markdown files found in {:?}",
                self.paths
            )));
        }

        let mut out: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        let mut documents = 0;
        let mut chunks = 0;
        let mut truncations = 0;

        for file in &files {
            let text = match std::fs::read_to_string(file) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", file, e);
                    continue;
                }
            };

            let url = self
                .url
                .clone()
                .unwrap_or_else(|| file.display().to_string());
            let document = Document::new(text)
                .with_url(url)
                .with_keywords(self.keywords.clone());

            let report = splitter.split_with_report(&document);
            for chunk in &report.chunks {
                writeln!(out, "{}", serde_json::to_string(chunk)?)?;
            }
            if self.report {
                for event in &report.truncations {
                    eprintln!("{}", serde_json::to_string(event)?);
                }
            }

            documents += 1;
            chunks += report.chunks.len();
            truncations += report.truncations.len();
        }
        out.flush()?;

        if documents == 0 {
            return Err(AppError::Other(format!(
                "All {} documents were skipped",
                files.len()
            )));
        }

        tracing::info!(
            "Split {} of {} documents into {} chunks ({} truncations)",
            documents,
            files.len(),
            chunks,
            truncations
        );

        Ok(())
    }
}

/// Markdown files under `paths`, in walk order.
///
/// Explicit file arguments are kept whatever their extension.
fn collect_markdown_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.exists() {
            tracing::warn!("Path does not exist: {:?}", path);
            // Still listed so the read failure is reported per document
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() && is_markdown(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unreadable entry: {}", e),
            }
        }
    }
    files
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_markdown_files() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("b.md"), "# B").unwrap();
        std::fs::write(temp.path().join("nested/a.MARKDOWN"), "# A").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "skip").unwrap();

        let files = collect_markdown_files(&[temp.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b.md", "a.MARKDOWN"]);
    }

    #[test]
    fn test_explicit_file_kept() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("readme.txt");
        std::fs::write(&file, "text").unwrap();
        assert_eq!(collect_markdown_files(&[file.clone()]), vec![file]);
    }

    #[test]
    fn test_split_writes_jsonl() {
        let temp = TempDir::new().unwrap();
        let input = temp.path().join("doc.md");
        std::fs::write(&input, "# Title\n\nSome text about the topic.").unwrap();
        let output = temp.path().join("chunks.jsonl");

        let cmd = SplitCommand {
            paths: vec![input],
            url: Some("https://example.com/doc".to_string()),
            keywords: "docs".to_string(),
            output: Some(output.clone()),
            report: false,
        };
        cmd.execute(&AppConfig::default()).unwrap();

        let written = std::fs::read_to_string(output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 1);
        let chunk: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(chunk["url"], "https://example.com/doc");
        assert_eq!(chunk["keywords"], "docs");
        assert_eq!(chunk["metadata"]["chunks_count"], 1);
    }

    #[test]
    fn test_all_documents_skipped_fails() {
        let temp = TempDir::new().unwrap();
        let cmd = SplitCommand {
            paths: vec![temp.path().join("missing.md")],
            url: None,
            keywords: String::new(),
            output: Some(temp.path().join("out.jsonl")),
            report: false,
        };
        assert!(cmd.execute(&AppConfig::default()).is_err());
    }
}
