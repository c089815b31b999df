//! Process-wide pipeline host
//!
//! Owns the state that lives for the whole process: the loaded statistical
//! model, the backend chain, the lazily opened secondary store handle and the
//! shared [`Pipeline`]. Created once at startup with
//! [`PipelineHost::initialize`], which also installs the tracing subscriber,
//! and torn down with [`PipelineHost::shutdown`].

use crate::backends::{LexiconBackend, RemoteInferenceBackend, SentimentBackend, StatisticalModel};
use crate::config::resolve_inference_api_key;
use crate::error::IngestResult;
use crate::fallback::{FallbackClassifier, SourcedLabel};
use crate::fetch::{CommentFetcher, FetchRequest};
use crate::orchestrator::{Pipeline, PipelineConfig};
use crate::store::{LocalStore, ObjectStore, SecondaryStore};
use crate::types::{PipelineEvent, PipelineOutput};
use anyhow::{bail, Context, Result};
use senti_common::config::TomlConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Backend names accepted in `pipeline.backend_order`
pub const KNOWN_BACKENDS: [&str; 3] = ["statistical", "remote", "lexicon"];

pub struct PipelineHost {
    config: TomlConfig,
    pipeline: Arc<Pipeline>,
    fetcher: CommentFetcher,
    secondary: Arc<SecondaryStore>,
}

impl PipelineHost {
    pub async fn initialize(config: TomlConfig) -> Result<Self> {
        Self::build(config, None).await
    }

    /// Initialize with an event channel attached to the pipeline
    pub async fn initialize_with_events(
        config: TomlConfig,
        event_tx: mpsc::Sender<PipelineEvent>,
    ) -> Result<Self> {
        Self::build(config, Some(event_tx)).await
    }

    async fn build(
        config: TomlConfig,
        event_tx: Option<mpsc::Sender<PipelineEvent>>,
    ) -> Result<Self> {
        senti_common::logging::init_tracing(&config.logging)
            .context("Failed to initialize logging")?;

        let primary: Arc<dyn ObjectStore> = Arc::new(LocalStore::new());
        let raw_root = config.storage.raw_root();
        let preprocessed_root = config.storage.preprocessed_root();

        for root in [&raw_root, &preprocessed_root] {
            primary
                .mkdir_all(root)
                .await
                .with_context(|| format!("Failed to create data directory {}", root.display()))?;
        }
        info!("Initialized data directories under {}", config.storage.data_root.display());

        let backends = build_backends(&config)?;
        let classifier =
            FallbackClassifier::new(backends).context("Failed to build backend chain")?;
        info!(backends = ?classifier.backend_names(), "Sentiment backend chain ready");

        // Connection is opened on first mirror write
        let secondary = Arc::new(SecondaryStore::webhdfs(config.secondary.clone()));

        let mut pipeline = Pipeline::new(
            PipelineConfig {
                primary_root: preprocessed_root,
                secondary_root: PathBuf::from(&config.secondary.preprocessed_root),
                max_in_flight: config.pipeline.max_in_flight,
            },
            Arc::new(classifier),
            Arc::clone(&primary),
            Arc::clone(&secondary),
        );
        if let Some(tx) = event_tx {
            pipeline = pipeline.with_events(tx);
        }

        let fetcher = CommentFetcher::new(
            &config.fetch,
            raw_root,
            PathBuf::from(&config.secondary.raw_root),
            primary,
            Arc::clone(&secondary),
        );

        Ok(Self {
            config,
            pipeline: Arc::new(pipeline),
            fetcher,
            secondary,
        })
    }

    pub fn config(&self) -> &TomlConfig {
        &self.config
    }

    /// Shared pipeline; clone the `Arc` for concurrent runs
    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    pub fn fetcher(&self) -> &CommentFetcher {
        &self.fetcher
    }

    /// Run the pipeline on an existing raw file with the configured batch size
    pub async fn analyze(&self, raw_path: &Path, category: &str) -> IngestResult<PipelineOutput> {
        self.pipeline
            .run(raw_path, category, self.config.pipeline.batch_size)
            .await
    }

    /// Fetch comments, then analyze the fetched file
    pub async fn fetch_and_analyze(
        &self,
        request: &FetchRequest,
        output_hint: Option<&str>,
    ) -> IngestResult<PipelineOutput> {
        let raw_path = self.fetcher.fetch(request, output_hint).await?;
        self.analyze(&raw_path, request.category().as_str()).await
    }

    /// Classify one ad-hoc text
    ///
    /// `None` runs the configured fallback chain. `Some(name)` uses only that
    /// backend from the chain, with no fallback.
    pub async fn classify_text(
        &self,
        text: &str,
        backend: Option<&str>,
    ) -> IngestResult<SourcedLabel> {
        let classifier = self.pipeline.classifier();
        match backend {
            Some(name) => classifier.classify_with(name, text).await,
            None => classifier.classify_with_source(text).await,
        }
    }

    /// Close the secondary store handle; later mirror writes fail
    pub fn shutdown(&self) {
        self.secondary.close();
        info!("Pipeline host shut down");
    }
}

/// Build the backend chain in `pipeline.backend_order`
pub fn build_backends(config: &TomlConfig) -> Result<Vec<Arc<dyn SentimentBackend>>> {
    let mut backends: Vec<Arc<dyn SentimentBackend>> = Vec::new();

    for name in &config.pipeline.backend_order {
        let backend: Arc<dyn SentimentBackend> = match name.trim().to_ascii_lowercase().as_str() {
            "statistical" => Arc::new(StatisticalModel::load_or_unavailable(
                config.model.path.as_deref(),
            )),
            "remote" => {
                let api_key = resolve_inference_api_key(config);
                Arc::new(
                    RemoteInferenceBackend::from_config(&config.inference, api_key)
                        .context("Failed to build remote inference backend")?,
                )
            }
            "lexicon" => Arc::new(LexiconBackend::new()),
            other => bail!(
                "Unknown sentiment backend '{}' (expected one of: {})",
                other,
                KNOWN_BACKENDS.join(", ")
            ),
        };
        backends.push(backend);
    }

    Ok(backends)
}
