//! Storage sinks
//!
//! Both sinks expose the same three operations so the dual-sink writer never
//! needs to know which kind of store it is talking to:
//! - `local` - primary store on the local filesystem
//! - `webhdfs` - secondary distributed store over the WebHDFS REST API
//! - `secondary` - lazily opened, process-wide handle to the secondary store

pub mod local;
pub mod secondary;
pub mod webhdfs;

pub use local::LocalStore;
pub use secondary::SecondaryStore;
pub use webhdfs::WebHdfsStore;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Store operation failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Request never produced a response (connect refused, timeout, ...)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Store answered with an unexpected status
    #[error("Store returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Handle was closed at shutdown
    #[error("Store connection closed")]
    Closed,
}

/// Filesystem-like storage contract shared by the primary and secondary sinks
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &str;

    /// Create a directory and all missing parents; existing directories are fine
    async fn mkdir_all(&self, path: &Path) -> Result<(), StoreError>;

    /// Replace the file at `path` with `contents`, creating it if absent
    async fn create_or_truncate(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError>;

    async fn exists(&self, path: &Path) -> Result<bool, StoreError>;
}

/// Create the parent directory of `path`, then write `contents` to it
pub async fn write_with_parents(
    store: &dyn ObjectStore,
    path: &Path,
    contents: &[u8],
) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        store.mkdir_all(parent).await?;
    }
    store.create_or_truncate(path, contents).await
}
