//! Comment fetching through external scripts
//!
//! Raw comment files are produced by Python scripts, one per category:
//!
//! | Request   | Script                  | Arguments                                            |
//! |-----------|-------------------------|------------------------------------------------------|
//! | Keyword   | `fetch_by_keyword.py`   | keyword num_posts comments_per_post sort_by output   |
//! | Subreddit | `fetch_by_subreddit.py` | subreddit num_posts comments_per_post sort_by output |
//! | Post      | `fetch_by_post.py`      | post_link comments_per_post output                   |
//!
//! Scripts run with the scripts directory as working directory. Their stdout
//! and stderr are captured; a non-zero exit is `FetchFailed` carrying both.
//! A successful fetch is mirrored to the secondary raw root (best-effort).

use crate::error::{IngestError, IngestResult};
use crate::path_codec::StoragePath;
use crate::store::{ObjectStore, SecondaryStore};
use crate::types::Category;
use crate::writer::DualSinkWriter;
use senti_common::config::FetchConfig;
use senti_common::time;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Keyword {
        keyword: String,
        num_posts: u32,
        comments_per_post: u32,
        sort_by: String,
    },
    Subreddit {
        subreddit: String,
        num_posts: u32,
        comments_per_post: u32,
        sort_by: String,
    },
    Post {
        link: String,
        comments_per_post: u32,
    },
}

impl FetchRequest {
    pub fn category(&self) -> Category {
        match self {
            Self::Keyword { .. } => Category::Keyword,
            Self::Subreddit { .. } => Category::Subreddit,
            Self::Post { .. } => Category::Post,
        }
    }

    /// Unsanitized identifier used for the output path
    pub fn identifier(&self) -> &str {
        match self {
            Self::Keyword { keyword, .. } => keyword,
            Self::Subreddit { subreddit, .. } => subreddit,
            Self::Post { link, .. } => link,
        }
    }

    pub fn script(&self) -> &'static str {
        match self {
            Self::Keyword { .. } => "fetch_by_keyword.py",
            Self::Subreddit { .. } => "fetch_by_subreddit.py",
            Self::Post { .. } => "fetch_by_post.py",
        }
    }

    /// Script arguments, output path excluded
    pub fn script_args(&self) -> Vec<String> {
        match self {
            Self::Keyword {
                keyword: name,
                num_posts,
                comments_per_post,
                sort_by,
            }
            | Self::Subreddit {
                subreddit: name,
                num_posts,
                comments_per_post,
                sort_by,
            } => vec![
                name.clone(),
                num_posts.to_string(),
                comments_per_post.to_string(),
                sort_by.clone(),
            ],
            Self::Post {
                link,
                comments_per_post,
            } => vec![link.clone(), comments_per_post.to_string()],
        }
    }
}

/// Runs fetch scripts and places their output in the raw layout
pub struct CommentFetcher {
    python: String,
    scripts_dir: PathBuf,
    raw_root: PathBuf,
    secondary_raw_root: PathBuf,
    primary: Arc<dyn ObjectStore>,
    mirror: DualSinkWriter,
}

impl CommentFetcher {
    pub fn new(
        config: &FetchConfig,
        raw_root: impl Into<PathBuf>,
        secondary_raw_root: impl Into<PathBuf>,
        primary: Arc<dyn ObjectStore>,
        secondary: Arc<SecondaryStore>,
    ) -> Self {
        let mirror = DualSinkWriter::new(Arc::clone(&primary), secondary);
        Self {
            python: config.python.clone(),
            scripts_dir: config.scripts_dir.clone(),
            raw_root: raw_root.into(),
            secondary_raw_root: secondary_raw_root.into(),
            primary,
            mirror,
        }
    }

    /// Run the script for `request` and return the local raw file path
    ///
    /// With `output_hint` the file is named after the hint (`.csv` appended
    /// when missing) instead of `identifier_timestamp.csv`.
    pub async fn fetch(
        &self,
        request: &FetchRequest,
        output_hint: Option<&str>,
    ) -> IngestResult<PathBuf> {
        let storage = StoragePath::new(
            &self.raw_root,
            request.category().as_str(),
            request.identifier(),
            time::path_timestamp_now(),
        )?;
        let file_name = match output_hint {
            Some(hint) => hinted_file_name(hint)?,
            None => storage.file_name(),
        };
        let output = storage.directory().join(&file_name);

        self.primary.mkdir_all(&storage.directory()).await?;
        let output = std::path::absolute(&output)?;

        let script_output = self.run_script(request, &output).await?;
        if !self.primary.exists(&output).await? {
            tracing::error!(
                script = request.script(),
                path = %output.display(),
                output = %script_output.trim(),
                "Fetch script exited successfully without writing its output"
            );
            return Err(IngestError::NotFound(output));
        }
        tracing::info!(path = %output.display(), "Fetched raw comments");

        let mirror_path = storage
            .mirrored(&self.secondary_raw_root)
            .directory()
            .join(&file_name);
        // The local file stands even when the mirror fails
        if let Err(e) = self.mirror.mirror_file(&output, &mirror_path).await {
            tracing::debug!(error = %e, "Raw file kept without secondary mirror");
        }

        Ok(output)
    }

    /// Run the script; returns its combined stdout and stderr
    async fn run_script(&self, request: &FetchRequest, output: &Path) -> IngestResult<String> {
        let script = self.scripts_dir.join(request.script());
        if !script.is_file() {
            return Err(IngestError::NotFound(script));
        }

        tracing::debug!(
            script = request.script(),
            args = ?request.script_args(),
            "Running fetch script"
        );

        let result = Command::new(&self.python)
            .arg(request.script())
            .args(request.script_args())
            .arg(output)
            .current_dir(&self.scripts_dir)
            .kill_on_drop(true)
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&result.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&result.stderr));

        if !result.status.success() {
            tracing::error!(
                script = request.script(),
                status = ?result.status.code(),
                "Fetch script failed"
            );
            return Err(IngestError::FetchFailed {
                status: result.status.code(),
                output: combined,
            });
        }

        tracing::debug!(output = %combined.trim(), "Fetch script finished");
        Ok(combined)
    }
}

/// Validate an output file name hint and append `.csv` if missing
fn hinted_file_name(hint: &str) -> IngestResult<String> {
    let hint = hint.trim();
    if hint.is_empty() || hint.contains(['/', '\\']) || hint == "." || hint == ".." {
        return Err(IngestError::InvalidInput(format!(
            "output file name '{}' is not a plain file name",
            hint
        )));
    }
    if hint.ends_with(".csv") {
        Ok(hint.to_string())
    } else {
        Ok(format!("{}.csv", hint))
    }
}
