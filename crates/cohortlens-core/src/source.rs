//! Local filesystem sheet source.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use crate::traits::SheetSource;

/// Reads sheets from disk, resolving relative locations against `root`.
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths that exist are read as-is; anything else is joined
    /// onto the root with leading slashes stripped.
    async fn resolve(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        if path.is_absolute() && tokio::fs::try_exists(path).await.unwrap_or(false) {
            path.to_path_buf()
        } else {
            self.root.join(location.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl SheetSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self, location: &str) -> anyhow::Result<String> {
        let path = self.resolve(location).await;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read sheet: {}", path.display()))?;
        String::from_utf8(bytes)
            .with_context(|| format!("sheet is not valid UTF-8: {}", path.display()))
    }
}
