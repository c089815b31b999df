//! Core types shared across the ingest pipeline
//!
//! Defines the data contracts between stages:
//! - **Extraction → Batch:** [`Comment`]
//! - **Backend → Fallback → Batch:** [`SentimentLabel`]
//! - **Orchestrator → caller:** [`PipelineOutput`], [`PipelineEvent`]

use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Comments
// ============================================================================

/// One comment extracted from a raw manifest
///
/// Created by extraction, consumed by classification, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment text, trimmed, never blank
    pub text: String,
    /// 1-based data row in the source file (header excluded)
    pub row: usize,
}

impl Comment {
    pub fn new(text: impl Into<String>, row: usize) -> Self {
        Self {
            text: text.into(),
            row,
        }
    }
}

// ============================================================================
// Sentiment labels
// ============================================================================

/// Label granularity declared by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// `{Negative, Neutral, Positive}` (possibly only the two polar labels)
    Coarse,
    /// `{Very Negative, Negative, Neutral, Positive, Very Positive}`
    Fine,
}

/// Three-class vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CoarseLabel {
    Negative,
    Neutral,
    Positive,
}

impl CoarseLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
        }
    }
}

/// Five-class vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FineLabel {
    #[serde(rename = "Very Negative")]
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    #[serde(rename = "Very Positive")]
    VeryPositive,
}

impl FineLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryNegative => "Very Negative",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
            Self::Positive => "Positive",
            Self::VeryPositive => "Very Positive",
        }
    }

    /// Map a 0..=4 class index (0 = very negative) to a label
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Self::VeryNegative),
            1 => Some(Self::Negative),
            2 => Some(Self::Neutral),
            3 => Some(Self::Positive),
            4 => Some(Self::VeryPositive),
            _ => None,
        }
    }
}

/// A label from one of the two fixed vocabularies
///
/// The vocabulary is chosen by whichever backend produced the label. The two
/// vocabularies are kept apart: a coarse `Positive` and a fine `Positive`
/// render identically but are different values and are tallied separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Coarse(CoarseLabel),
    Fine(FineLabel),
}

impl SentimentLabel {
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Coarse(_) => Granularity::Coarse,
            Self::Fine(_) => Granularity::Fine,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coarse(label) => label.as_str(),
            Self::Fine(label) => label.as_str(),
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CoarseLabel> for SentimentLabel {
    fn from(label: CoarseLabel) -> Self {
        Self::Coarse(label)
    }
}

impl From<FineLabel> for SentimentLabel {
    fn from(label: FineLabel) -> Self {
        Self::Fine(label)
    }
}

/// Label counts, one table per vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LabelTally {
    pub coarse: BTreeMap<CoarseLabel, usize>,
    pub fine: BTreeMap<FineLabel, usize>,
}

impl LabelTally {
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a SentimentLabel>) -> Self {
        let mut tally = Self::default();
        for label in labels {
            tally.record(*label);
        }
        tally
    }

    pub fn record(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Coarse(l) => *self.coarse.entry(l).or_insert(0) += 1,
            SentimentLabel::Fine(l) => *self.fine.entry(l).or_insert(0) += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.coarse.values().sum::<usize>() + self.fine.values().sum::<usize>()
    }

    /// True when labels from both vocabularies were recorded
    pub fn is_mixed(&self) -> bool {
        !self.coarse.is_empty() && !self.fine.is_empty()
    }
}

// ============================================================================
// Categories
// ============================================================================

/// How the comments were gathered; decides raw column layout and path structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Keyword,
    Subreddit,
    Post,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Subreddit => "subreddit",
            Self::Post => "post",
        }
    }

    /// Zero-based column holding the comment text in the raw CSV
    pub fn comment_column(self) -> usize {
        match self {
            Self::Keyword | Self::Subreddit => 2,
            Self::Post => 1,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "subreddit" => Ok(Self::Subreddit),
            "post" => Ok(Self::Post),
            _ => Err(IngestError::UnsupportedCategory(s.to_string())),
        }
    }
}

// ============================================================================
// Pipeline results and progress events
// ============================================================================

/// Result of one orchestrator run
#[derive(Debug)]
pub struct PipelineOutput {
    pub run_id: Uuid,
    /// One label per surviving comment, in extraction order
    pub labels: Vec<SentimentLabel>,
    pub primary_path: PathBuf,
    pub secondary_path: PathBuf,
    /// Rows dropped for a blank comment field
    pub skipped_empty: usize,
    /// Rows dropped for having too few fields
    pub skipped_short: usize,
    pub tally: LabelTally,
    /// Set when the primary manifest was written but the mirror was not
    pub secondary_warning: Option<String>,
}

impl PipelineOutput {
    pub fn is_fully_mirrored(&self) -> bool {
        self.secondary_warning.is_none()
    }
}

/// Progress events emitted during a run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    RunStarted {
        run_id: Uuid,
        file_path: String,
        category: Category,
    },
    CommentsExtracted {
        run_id: Uuid,
        comments: usize,
        skipped: usize,
    },
    BatchStarted {
        start: usize,
        end: usize,
        total: usize,
    },
    BatchCompleted {
        processed: usize,
        total: usize,
    },
    ManifestWritten {
        run_id: Uuid,
        primary_path: String,
    },
    SecondaryMirrorFailed {
        run_id: Uuid,
        secondary_path: String,
        message: String,
    },
    RunCompleted {
        run_id: Uuid,
        labels: usize,
    },
}
