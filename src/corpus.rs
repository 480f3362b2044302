//! Corpus source selection.
//!
//! The corpus is either the bundled textbook configured in `[corpus].path` or
//! text the user supplies for one request: a file on the CLI, or the `corpus`
//! field of an HTTP request body. An upload always wins.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Where the corpus text for one request comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
    Bundled(PathBuf),
    Upload(PathBuf),
    /// Uploaded text sent inline with an HTTP request.
    Inline(String),
}

impl CorpusSource {
    /// Pick the upload when present, otherwise the bundled default.
    pub fn select(upload: Option<PathBuf>, bundled: PathBuf) -> Self {
        match upload {
            Some(path) => CorpusSource::Upload(path),
            None => CorpusSource::Bundled(bundled),
        }
    }

    /// Same rule as [`select`](Self::select) for text uploaded over HTTP.
    pub fn select_inline(upload: Option<String>, bundled: PathBuf) -> Self {
        match upload {
            Some(text) => CorpusSource::Inline(text),
            None => CorpusSource::Bundled(bundled),
        }
    }

    /// Backing file, if the corpus lives on disk.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CorpusSource::Bundled(p) | CorpusSource::Upload(p) => Some(p),
            CorpusSource::Inline(_) => None,
        }
    }

    /// Read the whole corpus into memory. Invalid UTF-8 is replaced, not
    /// rejected, so a badly encoded upload is still searchable.
    pub fn load(&self) -> Result<String> {
        match self {
            CorpusSource::Inline(text) => Ok(text.clone()),
            CorpusSource::Bundled(path) | CorpusSource::Upload(path) => {
                let bytes = std::fs::read(path).with_context(|| read_error(path))?;
                Ok(decode(path, bytes))
            }
        }
    }

    /// [`load`](Self::load) for async callers; file reads go through
    /// `tokio::fs` so they never block a runtime worker.
    pub async fn load_async(self) -> Result<String> {
        match self {
            CorpusSource::Inline(text) => Ok(text),
            CorpusSource::Bundled(path) | CorpusSource::Upload(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| read_error(&path))?;
                Ok(decode(&path, bytes))
            }
        }
    }
}

fn read_error(path: &Path) -> String {
    format!("Failed to read corpus file: {}", path.display())
}

fn decode(path: &Path, bytes: Vec<u8>) -> String {
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "corpus loaded");
    String::from_utf8_lossy(&bytes).into_owned()
}
