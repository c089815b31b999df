//! Ordered fallback over sentiment backends
//!
//! Backends are tried strictly in order. The first success wins outright;
//! labels from different backends are never combined.
//!
//! | Outcome of backend i | Action                                   |
//! |----------------------|------------------------------------------|
//! | success              | return its label                         |
//! | transient failure    | warn, try backend i+1                    |
//! | permanent failure    | return it, remaining backends untouched  |
//! | last one fails       | `AllBackendsFailed { attempts, last }`   |

use crate::backends::SentimentBackend;
use crate::error::{IngestError, IngestResult};
use crate::types::SentimentLabel;
use std::sync::Arc;

/// Label plus the backend that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedLabel {
    pub label: SentimentLabel,
    pub backend: String,
}

pub struct FallbackClassifier {
    backends: Vec<Arc<dyn SentimentBackend>>,
}

impl FallbackClassifier {
    /// Build a chain; at least one backend is required
    pub fn new(backends: Vec<Arc<dyn SentimentBackend>>) -> IngestResult<Self> {
        if backends.is_empty() {
            return Err(IngestError::InvalidInput(
                "fallback chain needs at least one backend".to_string(),
            ));
        }
        Ok(Self { backends })
    }

    /// Backend names in chain order
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn classify(&self, text: &str) -> IngestResult<SentimentLabel> {
        self.classify_with_source(text).await.map(|s| s.label)
    }

    pub async fn classify_with_source(&self, text: &str) -> IngestResult<SourcedLabel> {
        let mut last_error = None;

        for (attempt, backend) in self.backends.iter().enumerate() {
            match backend.classify(text).await {
                Ok(label) => {
                    tracing::debug!(
                        backend = backend.name(),
                        attempt,
                        %label,
                        "Comment classified"
                    );
                    return Ok(SourcedLabel {
                        label,
                        backend: backend.name().to_string(),
                    });
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        backend = backend.name(),
                        attempt,
                        error = %e,
                        "Sentiment backend failed, falling back"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    tracing::warn!(
                        backend = backend.name(),
                        attempt,
                        error = %e,
                        "Sentiment backend rejected input"
                    );
                    return Err(IngestError::Backend(e));
                }
            }
        }

        // Chain is non-empty, so reaching here means every backend failed
        match last_error {
            Some(last) => Err(IngestError::AllBackendsFailed {
                attempts: self.backends.len(),
                last,
            }),
            None => Err(IngestError::InvalidInput(
                "fallback chain has no backends".to_string(),
            )),
        }
    }

    /// Classify with one named backend from the chain, without fallback
    ///
    /// Names match case-insensitively. Any failure of that backend is
    /// returned as `Backend`.
    pub async fn classify_with(&self, name: &str, text: &str) -> IngestResult<SourcedLabel> {
        let wanted = name.trim();
        let backend = self
            .backends
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                IngestError::InvalidInput(format!(
                    "backend '{}' is not in the chain (available: {})",
                    wanted,
                    self.backend_names().join(", ")
                ))
            })?;

        let label = backend.classify(text).await.map_err(|e| {
            tracing::warn!(backend = backend.name(), error = %e, "Selected backend failed");
            IngestError::Backend(e)
        })?;
        Ok(SourcedLabel {
            label,
            backend: backend.name().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::types::{CoarseLabel, FineLabel};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        name: &'static str,
        outcome: Result<SentimentLabel, BackendError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, label: SentimentLabel) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Ok(label),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, error: BackendError) -> Arc<Self> {
            Arc::new(Self {
                name,
                outcome: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SentimentBackend for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn is_detailed(&self) -> bool {
            false
        }

        async fn classify(&self, _text: &str) -> Result<SentimentLabel, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(FallbackClassifier::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let a = Scripted::ok("a", CoarseLabel::Negative.into());
        let b = Scripted::ok("b", CoarseLabel::Positive.into());
        let chain = FallbackClassifier::new(vec![a.clone(), b.clone()]).unwrap();

        let sourced = chain.classify_with_source("text").await.unwrap();
        assert_eq!(sourced.label, CoarseLabel::Negative.into());
        assert_eq!(sourced.backend, "a");
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_falls_through() {
        let a = Scripted::failing("a", BackendError::transient("a", "timeout"));
        let b = Scripted::failing("b", BackendError::transient("b", "503"));
        let c = Scripted::ok("c", FineLabel::VeryPositive.into());
        let chain = FallbackClassifier::new(vec![a.clone(), b.clone(), c.clone()]).unwrap();

        let label = chain.classify("text").await.unwrap();
        assert_eq!(label, SentimentLabel::Fine(FineLabel::VeryPositive));
        assert_eq!((a.calls(), b.calls(), c.calls()), (1, 1, 1));
        assert_eq!(chain.backend_names(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_permanent_short_circuits() {
        let a = Scripted::failing("a", BackendError::permanent("a", "text cannot be empty"));
        let b = Scripted::ok("b", CoarseLabel::Neutral.into());
        let chain = FallbackClassifier::new(vec![a.clone(), b.clone()]).unwrap();

        let err = chain.classify("").await.unwrap_err();
        assert!(matches!(err, IngestError::Backend(ref e) if e.backend == "a"));
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_reports_last() {
        let a = Scripted::failing("a", BackendError::transient("a", "down"));
        let b = Scripted::failing("b", BackendError::transient("b", "also down"));
        let chain = FallbackClassifier::new(vec![a, b]).unwrap();

        match chain.classify("text").await.unwrap_err() {
            IngestError::AllBackendsFailed { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.backend, "b");
                assert_eq!(last.detail, "also down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_named_backend_skips_the_rest() {
        let a = Scripted::ok("a", CoarseLabel::Negative.into());
        let b = Scripted::ok("b", CoarseLabel::Positive.into());
        let chain = FallbackClassifier::new(vec![a.clone(), b.clone()]).unwrap();

        let sourced = chain.classify_with(" B ", "text").await.unwrap();
        assert_eq!(sourced.backend, "b");
        assert_eq!(sourced.label, CoarseLabel::Positive.into());
        assert_eq!(a.calls(), 0);
    }

    #[tokio::test]
    async fn test_named_backend_does_not_fall_back() {
        let a = Scripted::failing("a", BackendError::transient("a", "down"));
        let b = Scripted::ok("b", CoarseLabel::Positive.into());
        let chain = FallbackClassifier::new(vec![a, b.clone()]).unwrap();

        let err = chain.classify_with("a", "text").await.unwrap_err();
        assert!(matches!(err, IngestError::Backend(ref e) if e.is_transient()));
        assert_eq!(b.calls(), 0);

        let err = chain.classify_with("oracle", "text").await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidInput(ref m) if m.contains("a, b")));
    }
}
