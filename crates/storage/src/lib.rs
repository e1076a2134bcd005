use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::Country;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

pub const DEFAULT_CACHE_FILE_NAME: &str = "countries.json";

/// Persistent home for the full country catalog.
///
/// Both operations are best-effort. `load` returns `None` for "nothing usable
/// on disk" regardless of why, and `save` never reports failure to the caller.
#[async_trait]
pub trait CatalogCache: Send + Sync {
    async fn load(&self) -> Option<Vec<Country>>;
    async fn save(&self, countries: &[Country]);
}

/// Catalog cache backed by a single JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self::new(dir.as_ref().join(file_name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and decodes the cached catalog. `Ok(None)` means no file exists yet.
    pub async fn read_countries(&self) -> Result<Option<Vec<Country>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read country cache '{}'", self.path.display())
                })
            }
        };

        let countries = serde_json::from_slice::<Vec<Country>>(&bytes).with_context(|| {
            format!("failed to decode country cache '{}'", self.path.display())
        })?;
        Ok(Some(countries))
    }

    /// Replaces the cached catalog. The document is written to a fresh temp
    /// file in the target directory and persisted over the target, so readers
    /// see either the old or the new catalog, never a partial one.
    pub async fn write_countries(&self, countries: &[Country]) -> Result<()> {
        ensure_parent_dir_exists(&self.path).await?;

        let encoded = serde_json::to_vec(countries).context("failed to encode country catalog")?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, &encoded))
            .await
            .context("country cache writer task failed")??;

        Ok(())
    }
}

#[async_trait]
impl CatalogCache for JsonFileCache {
    async fn load(&self) -> Option<Vec<Country>> {
        match self.read_countries().await {
            Ok(Some(countries)) => {
                debug!(path = %self.path.display(), count = countries.len(), "country cache hit");
                Some(countries)
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "country cache miss");
                None
            }
            Err(err) => {
                warn!("treating unreadable country cache as a miss: {err:#}");
                None
            }
        }
    }

    async fn save(&self, countries: &[Country]) {
        match self.write_countries(countries).await {
            Ok(()) => debug!(path = %self.path.display(), count = countries.len(), "country cache written"),
            Err(err) => warn!("country cache write dropped: {err:#}"),
        }
    }
}

fn persist_atomically(path: &Path, encoded: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = NamedTempFile::new_in(parent).with_context(|| {
        format!("failed to create staging file in '{}'", parent.display())
    })?;
    staged
        .write_all(encoded)
        .context("failed to write staging file")?;
    staged.flush().context("failed to flush staging file")?;

    // On failure the staged file is dropped with the error and removed.
    staged
        .persist(path)
        .with_context(|| format!("failed to move country cache into place at '{}'", path.display()))?;

    Ok(())
}

async fn ensure_parent_dir_exists(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(parent).await.with_context(|| {
        format!(
            "failed to create parent directory '{}' for country cache",
            parent.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
