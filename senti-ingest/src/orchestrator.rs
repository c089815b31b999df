//! Pipeline orchestrator
//!
//! One run turns one raw comment file into a labelled manifest:
//!
//! 1. Read the raw file
//! 2. Extract the category's comment column, dropping blank and short rows
//! 3. Decode `{category, identifier}` from the raw path
//! 4. Classify every comment in batches through the fallback chain
//! 5. Build the `Preprocessed_Comment,Sentiment` manifest
//! 6. Write it to the primary store and mirror it to the secondary store
//!
//! Nothing is written until every comment has a label, so a failed or
//! cancelled run leaves no manifest behind. A failed mirror is reported on
//! [`PipelineOutput::secondary_warning`]; every other failure aborts the run.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(config, classifier, primary, secondary);
//! let output = pipeline.run(Path::new("raw/post/ts/p1_ts.csv"), "post", 10).await?;
//! println!("{} labels, written to {}", output.labels.len(), output.primary_path.display());
//! ```

use crate::batch::BatchProcessor;
use crate::error::{IngestError, IngestResult, SinkWriteError};
use crate::extract::{extract_comments, read_raw};
use crate::fallback::FallbackClassifier;
use crate::manifest::{Manifest, PROCESSED_HEADER};
use crate::path_codec::{build_path, decode_category_and_identifier};
use crate::store::{ObjectStore, SecondaryStore};
use crate::types::{Category, LabelTally, PipelineEvent, PipelineOutput};
use crate::writer::DualSinkWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of processed manifests in the primary store
    pub primary_root: PathBuf,
    /// Root of processed manifests in the secondary store
    pub secondary_root: PathBuf,
    /// Concurrent classifications inside a batch (1 = sequential)
    pub max_in_flight: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            primary_root: PathBuf::from("data/preprocessed"),
            secondary_root: PathBuf::from("/sentiment-analysis/preprocessed"),
            max_in_flight: 1,
        }
    }
}

/// Pipeline orchestrator
///
/// `Send + Sync`; share one instance behind an `Arc` for concurrent runs.
pub struct Pipeline {
    config: PipelineConfig,
    classifier: Arc<FallbackClassifier>,
    primary: Arc<dyn ObjectStore>,
    writer: DualSinkWriter,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: Arc<FallbackClassifier>,
        primary: Arc<dyn ObjectStore>,
        secondary: Arc<SecondaryStore>,
    ) -> Self {
        let writer = DualSinkWriter::new(Arc::clone(&primary), secondary);
        Self {
            config,
            classifier,
            primary,
            writer,
            event_tx: None,
        }
    }

    /// Attach an event channel for progress reporting
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &FallbackClassifier {
        &self.classifier
    }

    /// Process one raw file to completion
    pub async fn run(
        &self,
        raw_path: &Path,
        category: &str,
        batch_size: usize,
    ) -> IngestResult<PipelineOutput> {
        self.run_with_cancellation(raw_path, category, batch_size, CancellationToken::new())
            .await
    }

    /// Process one raw file, aborting with `Cancelled` when `cancel` fires
    pub async fn run_with_cancellation(
        &self,
        raw_path: &Path,
        category: &str,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> IngestResult<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "pipeline_run",
            %run_id,
            category,
            path = %raw_path.display()
        );

        self.run_inner(run_id, raw_path, category, batch_size, cancel)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        raw_path: &Path,
        category: &str,
        batch_size: usize,
        cancel: CancellationToken,
    ) -> IngestResult<PipelineOutput> {
        info!("Pipeline processing file: {}", raw_path.display());

        // Step 1-2: read and extract
        let content = read_raw(raw_path).await?;
        let category: Category = category.parse()?;

        self.emit_event(PipelineEvent::RunStarted {
            run_id,
            file_path: raw_path.to_string_lossy().to_string(),
            category,
        })
        .await;

        let extraction = extract_comments(&content, category);
        info!(
            comments = extraction.comments.len(),
            skipped_empty = extraction.skipped_empty,
            skipped_short = extraction.skipped_short,
            "Extracted comments"
        );
        self.emit_event(PipelineEvent::CommentsExtracted {
            run_id,
            comments: extraction.comments.len(),
            skipped: extraction.skipped(),
        })
        .await;

        // Step 3: identity from path structure
        let identity = decode_category_and_identifier(raw_path)?;

        // Step 4: classify
        let mut processor = BatchProcessor::new(Arc::clone(&self.classifier))
            .with_max_in_flight(self.config.max_in_flight)
            .with_cancellation(cancel);
        if let Some(tx) = &self.event_tx {
            processor = processor.with_events(tx.clone());
        }
        let labels = processor.process(&extraction.comments, batch_size).await?;

        // Step 5: manifest
        let mut manifest = Manifest::new(PROCESSED_HEADER);
        for (comment, label) in extraction.comments.iter().zip(&labels) {
            manifest.push_row([comment.text.as_str(), label.as_str()])?;
        }

        // Step 6: dual-sink write; creating the primary directory is part of
        // the primary leg
        let primary_path = build_path(
            self.primary.as_ref(),
            &self.config.primary_root,
            &identity.category,
            &identity.identifier,
        )
        .await
        .map_err(|e| match e {
            IngestError::Store(source) => IngestError::Sink(SinkWriteError::Primary {
                path: self.config.primary_root.join(&identity.category),
                source,
            }),
            other => other,
        })?;
        let secondary_path = primary_path
            .mirrored(&self.config.secondary_root)
            .to_path_buf();
        let primary_path = primary_path.to_path_buf();

        let secondary_warning = match self
            .writer
            .write(&manifest, &primary_path, &secondary_path)
            .await
        {
            Ok(()) => None,
            Err(e @ SinkWriteError::Secondary { .. }) => {
                warn!(error = %e, "Run completed without secondary mirror");
                self.emit_event(PipelineEvent::SecondaryMirrorFailed {
                    run_id,
                    secondary_path: secondary_path.to_string_lossy().to_string(),
                    message: e.to_string(),
                })
                .await;
                Some(e.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        self.emit_event(PipelineEvent::ManifestWritten {
            run_id,
            primary_path: primary_path.to_string_lossy().to_string(),
        })
        .await;

        let tally = LabelTally::from_labels(&labels);
        info!(
            labels = labels.len(),
            mixed_granularity = tally.is_mixed(),
            "Pipeline run complete"
        );
        self.emit_event(PipelineEvent::RunCompleted {
            run_id,
            labels: labels.len(),
        })
        .await;

        Ok(PipelineOutput {
            run_id,
            labels,
            primary_path,
            secondary_path,
            skipped_empty: extraction.skipped_empty,
            skipped_short: extraction.skipped_short,
            tally,
            secondary_warning,
        })
    }

    /// Emit pipeline event if channel configured
    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event).await;
        }
    }
}
