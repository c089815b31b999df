//! Remote inference backend (Model B)
//!
//! Posts the comment to a hosted 3-way sentiment model.
//!
//! # Wire format
//! - Request: `POST <endpoint>` with `Authorization: Bearer <key>` and body
//!   `{"inputs": "<text>"}`
//! - Response: `[[{"label": "LABEL_2", "score": 0.91}, ...]]` (a flat list is
//!   accepted too); the highest score wins
//! - Labels: `LABEL_0` → Negative, `LABEL_1` → Neutral, `LABEL_2` → Positive
//!
//! # Failure classification
//! - 400, 413, 422: input rejected → Permanent
//! - network errors, timeouts, 429, 5xx, other 4xx, unparseable bodies → Transient
//!
//! API Documentation: https://huggingface.co/docs/api-inference

use super::{require_text, SentimentBackend};
use crate::error::{BackendError, BackendErrorKind, IngestError, IngestResult};
use crate::types::{CoarseLabel, SentimentLabel};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use senti_common::config::InferenceConfig;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

const BACKEND_NAME: &str = "remote";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Nested(outer) => outer.into_iter().flatten().collect(),
            Self::Flat(scores) => scores,
        }
    }
}

/// Hosted model client
///
/// Requests are paced by a token bucket shared by every concurrent caller.
pub struct RemoteInferenceBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl RemoteInferenceBackend {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
        connect_timeout: Duration,
        requests_per_second: u32,
    ) -> IngestResult<Self> {
        let per_second = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            IngestError::Common(senti_common::Error::Config(
                "inference.requests_per_second must be at least 1".to_string(),
            ))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| {
                IngestError::Common(senti_common::Error::Config(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Build from `[inference]` settings with an already resolved API key
    pub fn from_config(config: &InferenceConfig, api_key: Option<String>) -> IngestResult<Self> {
        if api_key.is_none() {
            tracing::warn!("No inference API key configured; remote requests are unauthenticated");
        }
        Self::new(
            config.endpoint.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
            config.requests_per_second,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Fallback eligibility for a non-success HTTP status
pub fn classify_status(status: StatusCode) -> BackendErrorKind {
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::UNPROCESSABLE_ENTITY => {
            BackendErrorKind::Permanent
        }
        _ => BackendErrorKind::Transient,
    }
}

/// Map a model label to the coarse scale
pub fn map_label(label: &str) -> Option<CoarseLabel> {
    match label {
        "LABEL_0" => Some(CoarseLabel::Negative),
        "LABEL_1" => Some(CoarseLabel::Neutral),
        "LABEL_2" => Some(CoarseLabel::Positive),
        _ => None,
    }
}

/// Pick the highest scoring label from a response body
fn parse_response(body: &str) -> Result<CoarseLabel, BackendError> {
    let response: InferenceResponse = serde_json::from_str(body).map_err(|e| {
        BackendError::transient(BACKEND_NAME, format!("Failed to parse inference response: {}", e))
    })?;

    let best = response
        .into_scores()
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| {
            BackendError::transient(BACKEND_NAME, "inference response had no predictions")
        })?;

    map_label(&best.label).ok_or_else(|| {
        BackendError::transient(BACKEND_NAME, format!("unknown model label '{}'", best.label))
    })
}

#[async_trait]
impl SentimentBackend for RemoteInferenceBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn is_detailed(&self) -> bool {
        false
    }

    async fn classify(&self, text: &str) -> Result<SentimentLabel, BackendError> {
        let text = require_text(BACKEND_NAME, text)?;

        self.rate_limiter.until_ready().await;

        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&InferenceRequest { inputs: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            let detail = if e.is_timeout() {
                format!("request timed out: {}", e)
            } else {
                format!("request failed: {}", e)
            };
            BackendError::transient(BACKEND_NAME, detail)
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            BackendError::transient(BACKEND_NAME, format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            tracing::debug!(backend = BACKEND_NAME, %status, "Inference request rejected");
            return Err(BackendError {
                backend: BACKEND_NAME.to_string(),
                kind: classify_status(status),
                detail: format!("inference API returned {}: {}", status, body.trim()),
            });
        }

        Ok(parse_response(&body)?.into())
    }
}
