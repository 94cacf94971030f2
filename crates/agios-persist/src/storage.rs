use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// Byte storage for uploaded files
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Create `path` and any missing parents; existing directories are fine
    async fn create_directory(&self, path: &Path) -> Result<()>;

    /// Write `bytes` to `path`, replacing any previous content
    async fn save_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Delete a stored file; a missing file is not an error
    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Root directory uploads are stored under
    fn root(&self) -> &Path;

    /// Location of a stored upload by its storage name
    fn path_for(&self, file_name: &str) -> PathBuf {
        self.root().join(file_name)
    }
}

/// Local filesystem storage rooted at a single upload directory
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn create_directory(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn save_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "stored file");
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn root(&self) -> &Path {
        &self.root
    }
}
