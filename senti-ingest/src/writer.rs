//! Dual-sink manifest writer
//!
//! The primary (local) write is authoritative. The secondary mirror receives
//! the same bytes afterwards and is best-effort: its failure is reported as a
//! partial success and never invalidates the primary artifact.

use crate::error::SinkWriteError;
use crate::manifest::Manifest;
use crate::store::{write_with_parents, ObjectStore, SecondaryStore};
use std::path::Path;
use std::sync::Arc;

pub struct DualSinkWriter {
    primary: Arc<dyn ObjectStore>,
    secondary: Arc<SecondaryStore>,
}

impl DualSinkWriter {
    pub fn new(primary: Arc<dyn ObjectStore>, secondary: Arc<SecondaryStore>) -> Self {
        Self { primary, secondary }
    }

    /// Write `manifest` to both sinks, overwriting any existing artifact
    ///
    /// A primary failure aborts before the secondary is touched. A disabled
    /// secondary store is skipped silently.
    pub async fn write(
        &self,
        manifest: &Manifest,
        primary_path: &Path,
        secondary_path: &Path,
    ) -> Result<(), SinkWriteError> {
        let bytes = manifest.to_csv_bytes();

        write_with_parents(self.primary.as_ref(), primary_path, &bytes)
            .await
            .map_err(|source| SinkWriteError::Primary {
                path: primary_path.to_path_buf(),
                source,
            })?;

        tracing::info!(
            path = %primary_path.display(),
            rows = manifest.len(),
            "Manifest written to primary store"
        );

        if !self.secondary.is_enabled() {
            tracing::debug!("Secondary store disabled; skipping mirror");
            return Ok(());
        }

        self.write_bytes_secondary(&bytes, secondary_path).await
    }

    /// Retry only the mirror leg
    pub async fn write_secondary(
        &self,
        manifest: &Manifest,
        secondary_path: &Path,
    ) -> Result<(), SinkWriteError> {
        self.write_bytes_secondary(&manifest.to_csv_bytes(), secondary_path)
            .await
    }

    /// Mirror a local file (raw fetch output) to the secondary store
    ///
    /// No-op when the secondary store is disabled.
    pub async fn mirror_file(
        &self,
        local_path: &Path,
        secondary_path: &Path,
    ) -> Result<(), SinkWriteError> {
        if !self.secondary.is_enabled() {
            return Ok(());
        }
        let bytes = match tokio::fs::read(local_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(
                    local = %local_path.display(),
                    path = %secondary_path.display(),
                    error = %e,
                    "Secondary mirror failed; local file unreadable"
                );
                return Err(SinkWriteError::Secondary {
                    path: secondary_path.to_path_buf(),
                    source: e.into(),
                });
            }
        };
        self.write_bytes_secondary(&bytes, secondary_path).await
    }

    async fn write_bytes_secondary(
        &self,
        bytes: &[u8],
        secondary_path: &Path,
    ) -> Result<(), SinkWriteError> {
        let result = async {
            let store = self.secondary.handle().await?;
            write_with_parents(store.as_ref(), secondary_path, bytes).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(path = %secondary_path.display(), "Mirrored to secondary store");
                Ok(())
            }
            Err(source) => {
                tracing::warn!(
                    path = %secondary_path.display(),
                    error = %source,
                    "Secondary mirror failed; primary artifact kept"
                );
                Err(SinkWriteError::Secondary {
                    path: secondary_path.to_path_buf(),
                    source,
                })
            }
        }
    }
}
