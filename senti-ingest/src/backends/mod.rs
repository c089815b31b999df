//! Sentiment backends
//!
//! Three independent engines behind one trait, tried in order by the
//! [`FallbackClassifier`](crate::fallback::FallbackClassifier):
//! 1. **statistical_model** - local logistic model loaded from disk (coarse)
//! 2. **remote_api** - hosted transformer over HTTP (coarse, 3-way)
//! 3. **lexicon** - built-in lexicon with negation and intensifiers (fine, 5-way)
//!
//! Backends never touch pipeline state; each call is independent.

pub mod lexicon;
pub mod remote_api;
pub mod statistical_model;

pub use lexicon::LexiconBackend;
pub use remote_api::RemoteInferenceBackend;
pub use statistical_model::{LogisticModel, StatisticalModel};

use crate::error::BackendError;
use crate::types::SentimentLabel;
use async_trait::async_trait;

/// A single sentiment inference engine
///
/// Failures are tagged Transient (try the next backend) or Permanent (the
/// input itself is unusable).
#[async_trait]
pub trait SentimentBackend: Send + Sync {
    /// Backend name for logging and diagnostics
    fn name(&self) -> &str;

    /// True when labels use the 5-way fine scale
    fn is_detailed(&self) -> bool;

    async fn classify(&self, text: &str) -> Result<SentimentLabel, BackendError>;
}

/// Reject blank input before any backend work is done
pub fn require_text<'a>(backend: &str, text: &'a str) -> Result<&'a str, BackendError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(BackendError::permanent(backend, "text cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("x", "  hello ").unwrap(), "hello");

        let err = require_text("x", " \t\n").unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Permanent);
        assert_eq!(err.detail, "text cannot be empty");
    }
}
