//! Statistical model backend (Model A)
//!
//! Binary logistic model over normalized tokens, read once from a JSON file:
//!
//! ```json
//! { "bias": -0.1, "weights": { "great": 1.7, "awful": -2.1 } }
//! ```
//!
//! Scores at or above 0.5 are `Positive`, everything else `Negative`. The
//! model never produces `Neutral`.

use super::{require_text, SentimentBackend};
use crate::error::{BackendError, IngestError, IngestResult};
use crate::types::{CoarseLabel, SentimentLabel};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

const BACKEND_NAME: &str = "statistical";

/// Decision threshold on the sigmoid output
const POSITIVE_THRESHOLD: f64 = 0.5;

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://\S+|@\w+|#\w+").expect("noise pattern is a valid regex")
});
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("alnum pattern is a valid regex"));

/// Logistic regression weights
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

impl LogisticModel {
    /// Read a model from a JSON file
    pub fn load(path: &Path) -> IngestResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IngestError::NotFound(path.to_path_buf()),
            _ => IngestError::Io(e),
        })?;
        let model: LogisticModel = serde_json::from_str(&content).map_err(|e| {
            IngestError::InvalidInput(format!(
                "Failed to parse model {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            vocabulary = model.weights.len(),
            "Statistical model loaded"
        );
        Ok(model)
    }

    /// Probability of positive sentiment for already normalized text
    pub fn score(&self, normalized: &str) -> f64 {
        let z = normalized
            .split_whitespace()
            .filter_map(|token| self.weights.get(token))
            .fold(self.bias, |acc, w| acc + w);
        1.0 / (1.0 + (-z).exp())
    }
}

/// Strip URLs, mentions and hashtags, lowercase, drop punctuation, and
/// collapse any character repeated three or more times to two
pub fn normalize(text: &str) -> String {
    let stripped = NOISE_RE.replace_all(text, "");
    let lowered = stripped.to_lowercase();
    let alnum = NON_ALNUM_RE.replace_all(&lowered, "");
    collapse_repeats(&alnum)
}

fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last: Option<char> = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == last {
            run += 1;
        } else {
            last = Some(c);
            run = 1;
        }
        if run <= 2 {
            out.push(c);
        }
    }
    out
}

/// Backend wrapping an optional loaded model
///
/// The model is shared read-only; a backend built without one reports a
/// transient failure on every call so the chain moves on.
#[derive(Clone, Default)]
pub struct StatisticalModel {
    model: Option<Arc<LogisticModel>>,
}

impl StatisticalModel {
    pub fn new(model: LogisticModel) -> Self {
        Self {
            model: Some(Arc::new(model)),
        }
    }

    pub fn unavailable() -> Self {
        Self { model: None }
    }

    /// Load from `path`; a missing path or failed load leaves the backend unavailable
    pub fn load_or_unavailable(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::warn!("No statistical model configured; backend disabled");
            return Self::unavailable();
        };

        match LogisticModel::load(path) {
            Ok(model) => Self::new(model),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Statistical model failed to load; backend disabled"
                );
                Self::unavailable()
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }
}

#[async_trait]
impl SentimentBackend for StatisticalModel {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn is_detailed(&self) -> bool {
        false
    }

    async fn classify(&self, text: &str) -> Result<SentimentLabel, BackendError> {
        let text = require_text(BACKEND_NAME, text)?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| {
                BackendError::transient(BACKEND_NAME, "statistical model not available")
            })?;

        let probability = model.score(&normalize(text));
        tracing::trace!(backend = BACKEND_NAME, probability, "Scored comment");

        let label = if probability >= POSITIVE_THRESHOLD {
            CoarseLabel::Positive
        } else {
            CoarseLabel::Negative
        };
        Ok(label.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;
    use tempfile::TempDir;

    fn toy_model() -> LogisticModel {
        LogisticModel {
            bias: 0.0,
            weights: HashMap::from([
                ("great".to_string(), 2.0),
                ("love".to_string(), 1.5),
                ("awful".to_string(), -2.5),
                ("soo".to_string(), 0.5),
            ]),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("Check https://x.io/a @bob #rust THIS is GREAT!!!"),
            "check  this is great"
        );
        assert_eq!(normalize("Sooooo goooood"), "soo good");
        assert_eq!(normalize("aaa111"), "aa11");
    }

    #[test]
    fn test_score_is_sigmoid() {
        let model = toy_model();
        assert!((model.score("") - 0.5).abs() < 1e-9);
        assert!(model.score("great") > 0.8);
        assert!(model.score("awful") < 0.1);
    }

    #[tokio::test]
    async fn test_classify_coarse() {
        let backend = StatisticalModel::new(toy_model());
        assert!(!backend.is_detailed());

        let positive = backend.classify("I love it, GREAT!!!").await.unwrap();
        assert_eq!(positive, SentimentLabel::Coarse(CoarseLabel::Positive));

        let negative = backend.classify("awful").await.unwrap();
        assert_eq!(negative, SentimentLabel::Coarse(CoarseLabel::Negative));

        // Unknown words score exactly 0.5, which counts as positive
        let unknown = backend.classify("zzz").await.unwrap();
        assert_eq!(unknown, SentimentLabel::Coarse(CoarseLabel::Positive));
    }

    #[tokio::test]
    async fn test_unavailable_is_transient() {
        let backend = StatisticalModel::unavailable();
        let err = backend.classify("hello").await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Transient);
        assert_eq!(err.detail, "statistical model not available");

        let blank = backend.classify("   ").await.unwrap_err();
        assert_eq!(blank.kind, BackendErrorKind::Permanent);
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        std::fs::write(&path, r#"{"bias": 0.25, "weights": {"good": 1.0}}"#).unwrap();

        let backend = StatisticalModel::load_or_unavailable(Some(&path));
        assert!(backend.is_loaded());

        std::fs::write(&path, "not json").unwrap();
        assert!(!StatisticalModel::load_or_unavailable(Some(&path)).is_loaded());
        assert!(!StatisticalModel::load_or_unavailable(None).is_loaded());
        assert!(matches!(
            LogisticModel::load(&temp_dir.path().join("missing.json")),
            Err(IngestError::NotFound(_))
        ));
    }
}
