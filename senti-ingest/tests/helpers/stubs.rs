//! Stub sentiment backends and raw-file fixtures

use async_trait::async_trait;
use senti_ingest::backends::SentimentBackend;
use senti_ingest::path_codec::StoragePath;
use senti_ingest::{BackendError, CoarseLabel, SentimentLabel};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Timestamp used for fixture directories
pub const FIXTURE_TIMESTAMP: &str = "2024-03-01_14-05-09";

/// Backend returning the same outcome on every call
pub struct FixedBackend {
    name: String,
    outcome: Result<SentimentLabel, BackendError>,
    calls: AtomicUsize,
}

impl FixedBackend {
    pub fn ok(name: &str, label: impl Into<SentimentLabel>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Ok(label.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn transient(name: &str, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(BackendError::transient(name, detail)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn permanent(name: &str, detail: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            outcome: Err(BackendError::permanent(name, detail)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentBackend for FixedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_detailed(&self) -> bool {
        false
    }

    async fn classify(&self, _text: &str) -> Result<SentimentLabel, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// Coarse keyword matcher: "great"/"love"/"good" → Positive, anything else → Negative
pub struct KeywordBackend;

#[async_trait]
impl SentimentBackend for KeywordBackend {
    fn name(&self) -> &str {
        "keyword-stub"
    }

    fn is_detailed(&self) -> bool {
        false
    }

    async fn classify(&self, text: &str) -> Result<SentimentLabel, BackendError> {
        let lower = text.to_lowercase();
        if ["great", "love", "good"].iter().any(|w| lower.contains(w)) {
            Ok(CoarseLabel::Positive.into())
        } else {
            Ok(CoarseLabel::Negative.into())
        }
    }
}

/// Backend that never answers within a test's lifetime
pub struct StallingBackend {
    pub started: AtomicUsize,
}

impl StallingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SentimentBackend for StallingBackend {
    fn name(&self) -> &str {
        "stalling"
    }

    fn is_detailed(&self) -> bool {
        false
    }

    async fn classify(&self, _text: &str) -> Result<SentimentLabel, BackendError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(CoarseLabel::Neutral.into())
    }
}

/// Write `content` to `root/category/FIXTURE_TIMESTAMP/identifier_FIXTURE_TIMESTAMP.csv`
pub fn write_raw(root: &Path, category: &str, identifier: &str, content: &str) -> PathBuf {
    let path = StoragePath::new(root, category, identifier, FIXTURE_TIMESTAMP)
        .unwrap()
        .to_path_buf();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Only `.csv` files under `dir`, recursively
pub fn csv_files(dir: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return found;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            found.extend(csv_files(&path));
        } else if path.extension().is_some_and(|e| e == "csv") {
            found.push(path);
        }
    }
    found
}
