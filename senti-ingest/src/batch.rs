//! Batch processor
//!
//! Splits comments into contiguous batches and classifies each one through
//! the fallback chain. Batches only pace progress reporting; output is always
//! one label per comment, in input order.
//!
//! # Failure
//! The first classification error aborts the whole call with the failing
//! comment's index. No partial label list is ever returned.
//!
//! # Cancellation
//! The token is checked before each comment and raced against the in-flight
//! backend call.

use crate::error::{IngestError, IngestResult};
use crate::fallback::FallbackClassifier;
use crate::types::{Comment, PipelineEvent, SentimentLabel};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct BatchProcessor {
    classifier: Arc<FallbackClassifier>,
    max_in_flight: usize,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
    cancel: CancellationToken,
}

impl BatchProcessor {
    /// Strictly sequential processor
    pub fn new(classifier: Arc<FallbackClassifier>) -> Self {
        Self {
            classifier,
            max_in_flight: 1,
            event_tx: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Allow up to `max_in_flight` concurrent classifications inside a batch
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Classify every comment; `batch_size` must be at least 1
    pub async fn process(
        &self,
        comments: &[Comment],
        batch_size: usize,
    ) -> IngestResult<Vec<SentimentLabel>> {
        if batch_size == 0 {
            return Err(IngestError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }

        let total = comments.len();
        let mut labels = Vec::with_capacity(total);

        for (batch_index, batch) in comments.chunks(batch_size).enumerate() {
            let start = batch_index * batch_size;
            let end = start + batch.len();
            tracing::info!("Processing batch {}-{} of {} comments", start + 1, end, total);
            self.emit_event(PipelineEvent::BatchStarted { start, end, total })
                .await;

            if self.max_in_flight > 1 {
                let pending: Vec<_> = batch
                    .iter()
                    .enumerate()
                    .map(|(offset, comment)| self.classify_one(start + offset, comment))
                    .collect();
                let batch_labels: Vec<SentimentLabel> = futures::stream::iter(pending)
                .buffered(self.max_in_flight)
                .try_collect()
                .await?;
                labels.extend(batch_labels);
            } else {
                for (offset, comment) in batch.iter().enumerate() {
                    labels.push(self.classify_one(start + offset, comment).await?);
                }
            }

            self.emit_event(PipelineEvent::BatchCompleted {
                processed: end,
                total,
            })
            .await;
        }

        Ok(labels)
    }

    async fn classify_one(&self, index: usize, comment: &Comment) -> IngestResult<SentimentLabel> {
        if self.cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(IngestError::Cancelled),
            result = self.classifier.classify(&comment.text) => {
                result.map_err(|e| {
                    tracing::error!(
                        index,
                        row = comment.row,
                        error = %e,
                        "Comment classification failed"
                    );
                    IngestError::Classification {
                        index,
                        source: Box::new(e),
                    }
                })
            }
        }
    }

    /// Emit event if channel configured
    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}
