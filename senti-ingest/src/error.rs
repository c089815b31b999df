//! Error types for senti-ingest
//!
//! Backend failures carry a [`BackendErrorKind`] that decides fallback
//! eligibility. Sink failures distinguish the authoritative primary leg from
//! the best-effort secondary leg.

use crate::store::StoreError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type IngestResult<T> = Result<T, IngestError>;

/// Whether a backend failure may be retried on the next backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Network, timeout, service unavailable, model not loaded
    Transient,
    /// Malformed input; no other backend will do better
    Permanent,
}

impl fmt::Display for BackendErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

/// Failure reported by a single sentiment backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{backend} {kind} failure: {detail}")]
pub struct BackendError {
    pub backend: String,
    pub kind: BackendErrorKind,
    pub detail: String,
}

impl BackendError {
    pub fn transient(backend: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            kind: BackendErrorKind::Transient,
            detail: detail.into(),
        }
    }

    pub fn permanent(backend: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            kind: BackendErrorKind::Permanent,
            detail: detail.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == BackendErrorKind::Transient
    }
}

/// Failure of one leg of a dual-sink write
#[derive(Debug, Error)]
pub enum SinkWriteError {
    /// Authoritative write failed; nothing was mirrored
    #[error("primary write to {path} failed: {source}")]
    Primary {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// Primary artifact is valid; only the mirror is missing
    #[error("secondary mirror to {path} failed: {source}")]
    Secondary {
        path: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl SinkWriteError {
    /// True when the primary artifact was written successfully
    pub fn is_partial_success(&self) -> bool {
        matches!(self, Self::Secondary { .. })
    }
}

/// Pipeline error taxonomy
#[derive(Debug, Error)]
pub enum IngestError {
    /// Raw input file does not exist
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Category outside the fixed lookup table
    #[error("Unsupported category: {0}")]
    UnsupportedCategory(String),

    /// Permanent backend failure (short-circuits the fallback chain)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Every backend in the chain failed
    #[error("All {attempts} sentiment backends failed; last error: {last}")]
    AllBackendsFailed {
        attempts: usize,
        #[source]
        last: BackendError,
    },

    /// Classification of a specific comment failed
    #[error("Classification failed for comment {index}: {source}")]
    Classification {
        index: usize,
        #[source]
        source: Box<IngestError>,
    },

    /// Path does not follow the `root/category/timestamp/file` convention
    #[error("Malformed storage path {}: {reason}", .path.display())]
    MalformedPath { path: PathBuf, reason: String },

    /// Dual-sink write failure
    #[error(transparent)]
    Sink(#[from] SinkWriteError),

    /// External fetch process exited unsuccessfully
    #[error("Comment fetch failed (exit status {status:?}):\n{output}")]
    FetchFailed { status: Option<i32>, output: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Run cancelled before completion; nothing was written
    #[error("Pipeline run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Common error: {0}")]
    Common(#[from] senti_common::Error),
}

impl IngestError {
    /// Unwrap `Classification` layers to the error that started the failure
    pub fn originating(&self) -> &IngestError {
        match self {
            Self::Classification { source, .. } => source.originating(),
            other => other,
        }
    }
}
