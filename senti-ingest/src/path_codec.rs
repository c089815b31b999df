//! Storage path convention
//!
//! Every artifact lives at
//!
//! ```text
//! root/category/timestamp/identifier_timestamp.ext
//! ```
//!
//! The same derivation is used for the primary and the secondary store, only
//! the root differs, so artifacts can be correlated across sinks by path
//! suffix alone.
//!
//! Identifier sanitization is one-way: every character outside
//! `[A-Za-z0-9_-]` becomes `_`, and the original identifier cannot be
//! recovered from the path.

use crate::error::{IngestError, IngestResult};
use crate::store::ObjectStore;
use senti_common::time;
use std::path::{Path, PathBuf};

/// Default artifact extension
pub const CSV_EXTENSION: &str = "csv";

/// Replace characters outside `[A-Za-z0-9_-]` with `_` (lossy)
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Category and identifier recovered from a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathIdentity {
    pub category: String,
    pub identifier: String,
}

/// A path in the `root/category/timestamp/identifier_timestamp.ext` layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    root: PathBuf,
    category: String,
    timestamp: String,
    identifier: String,
}

impl StoragePath {
    /// Assemble a path without touching any store
    ///
    /// The identifier is sanitized. The category must be a single non-empty
    /// path segment.
    pub fn new(
        root: impl Into<PathBuf>,
        category: &str,
        identifier: &str,
        timestamp: impl Into<String>,
    ) -> IngestResult<Self> {
        if category.is_empty()
            || category.contains(['/', '\\'])
            || category == "."
            || category == ".."
        {
            return Err(IngestError::InvalidInput(format!(
                "category '{}' is not a single path segment",
                category
            )));
        }
        if identifier.trim().is_empty() {
            return Err(IngestError::InvalidInput(
                "identifier cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            root: root.into(),
            category: category.to_string(),
            timestamp: timestamp.into(),
            identifier: sanitize_identifier(identifier),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Sanitized identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// `root/category/timestamp`
    pub fn directory(&self) -> PathBuf {
        self.root.join(&self.category).join(&self.timestamp)
    }

    /// `identifier_timestamp.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.identifier, self.timestamp, CSV_EXTENSION)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.directory().join(self.file_name())
    }

    /// Same category, timestamp and identifier under another root
    pub fn mirrored(&self, root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..self.clone()
        }
    }
}

/// Build a path stamped with the current time and ensure its directory exists
///
/// Creating an already existing directory is not an error.
pub async fn build_path(
    store: &dyn ObjectStore,
    root: &Path,
    category: &str,
    identifier: &str,
) -> IngestResult<StoragePath> {
    let path = StoragePath::new(root, category, identifier, time::path_timestamp_now())?;
    store.mkdir_all(&path.directory()).await?;

    tracing::info!(
        store = store.name(),
        "Created output path: {}",
        path.to_path_buf().display()
    );
    Ok(path)
}

/// Recover `{category, identifier}` from a path in the storage layout
///
/// `category` is the grandparent directory name. When the parent directory
/// is a path timestamp, as for paths produced by [`build_path`], the
/// identifier is the file stem minus the `_<timestamp>` suffix, so
/// identifiers containing `_` survive. Otherwise the identifier is the stem
/// up to its first `_`.
pub fn decode_category_and_identifier(path: &Path) -> IngestResult<PathIdentity> {
    let malformed = |reason: &str| IngestError::MalformedPath {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let timestamp_dir = path
        .parent()
        .and_then(|p| p.file_name().map(|name| (p, name)))
        .ok_or_else(|| malformed("missing timestamp directory"))?;
    let category = timestamp_dir
        .0
        .parent()
        .and_then(|p| p.file_name())
        .ok_or_else(|| malformed("missing category directory"))?
        .to_string_lossy()
        .into_owned();
    let timestamp = timestamp_dir.1.to_string_lossy();

    let stem = path
        .file_stem()
        .ok_or_else(|| malformed("missing file name"))?
        .to_string_lossy();

    let suffix = format!("_{}", timestamp);
    let stripped = time::is_path_timestamp(&timestamp)
        .then(|| stem.strip_suffix(suffix.as_str()))
        .flatten();
    let identifier = match stripped {
        Some(prefix) if !prefix.is_empty() => prefix,
        _ => stem.split('_').next().unwrap_or_default(),
    };

    if identifier.is_empty() {
        return Err(malformed("empty identifier"));
    }

    Ok(PathIdentity {
        category,
        identifier: identifier.to_string(),
    })
}
