//! senti-ingest: tiered sentiment inference over fetched comment files
//!
//! Raw comment CSVs are classified through an ordered chain of sentiment
//! backends and written as labelled manifests to a local primary store and a
//! WebHDFS secondary mirror.

pub mod backends;
pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod fetch;
pub mod host;
pub mod manifest;
pub mod orchestrator;
pub mod path_codec;
pub mod store;
pub mod types;
pub mod writer;

pub use crate::error::{BackendError, BackendErrorKind, IngestError, IngestResult, SinkWriteError};
pub use crate::fallback::{FallbackClassifier, SourcedLabel};
pub use crate::host::PipelineHost;
pub use crate::orchestrator::{Pipeline, PipelineConfig};
pub use crate::types::{
    Category, CoarseLabel, Comment, FineLabel, PipelineEvent, PipelineOutput, SentimentLabel,
};
