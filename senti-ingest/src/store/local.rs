//! Primary store backed by the local filesystem

use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use std::path::Path;

/// Local filesystem store. Paths are used as given.
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn mkdir_all(&self, path: &Path) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    async fn create_or_truncate(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        tokio::fs::write(path, contents).await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}
