//! Synthesized audio files
//!
//! Each consultation writes to its own file so concurrent sessions never
//! overwrite each other's playback.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::Result;

/// Directory of per-request audio files
#[derive(Debug, Clone)]
pub struct AudioOutputs {
    dir: PathBuf,
}

impl AudioOutputs {
    /// Use `dir` for synthesized audio; it is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fresh, unique file path with the given extension
    #[must_use]
    pub fn next_path(&self, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        self.dir.join(format!("{}.{extension}", Uuid::new_v4()))
    }

    /// Remove a stale file at `path`, if any
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be removed
    pub async fn clear(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed stale audio file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write audio bytes to `path`, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub async fn write(&self, path: &Path, audio: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, audio).await?;
        tracing::debug!(path = %path.display(), bytes = audio.len(), "wrote audio file");
        Ok(())
    }

    /// Delete audio files older than `max_age`, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns error if the directory exists but cannot be listed
    pub async fn prune(&self, max_age: Duration) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();

            if age >= max_age {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "failed to prune audio file");
                    }
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "pruned old audio files");
        }
        Ok(removed)
    }
}
