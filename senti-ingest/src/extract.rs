//! Raw comment extraction
//!
//! Raw files come from the fetch scripts: a header row, then one comment per
//! record in a category-specific column (see [`Category::comment_column`]).

use crate::error::{IngestError, IngestResult};
use crate::manifest::parse_records;
use crate::types::{Category, Comment};
use std::path::Path;

/// Comments pulled from one raw file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub comments: Vec<Comment>,
    /// Rows whose comment field was blank
    pub skipped_empty: usize,
    /// Rows without enough fields to reach the comment column
    pub skipped_short: usize,
}

impl Extraction {
    pub fn skipped(&self) -> usize {
        self.skipped_empty + self.skipped_short
    }
}

/// Read a raw file as text; a missing file is `NotFound`
pub async fn read_raw(path: &Path) -> IngestResult<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IngestError::NotFound(path.to_path_buf()),
        _ => IngestError::Io(e),
    })
}

/// Read `path` and extract its comment column
pub async fn read_comments(path: &Path, category: Category) -> IngestResult<Extraction> {
    let content = read_raw(path).await?;
    Ok(extract_comments(&content, category))
}

/// Extract comments from raw CSV text, skipping the header row
pub fn extract_comments(content: &str, category: Category) -> Extraction {
    let column = category.comment_column();
    let mut extraction = Extraction::default();

    for (row, record) in parse_records(content).into_iter().enumerate().skip(1) {
        let Some(field) = record.get(column) else {
            tracing::debug!(row, fields = record.len(), "Skipping short row");
            extraction.skipped_short += 1;
            continue;
        };

        let text = field.trim();
        if text.is_empty() {
            extraction.skipped_empty += 1;
            continue;
        }
        extraction.comments.push(Comment::new(text, row));
    }

    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_post_column() {
        let raw = "id,comment\n1,Great post\n2,  \n3,\"Terrible, really\"\n";
        let extraction = extract_comments(raw, Category::Post);

        let texts: Vec<&str> = extraction.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Great post", "Terrible, really"]);
        assert_eq!(extraction.comments[1].row, 3);
        assert_eq!(extraction.skipped_empty, 1);
        assert_eq!(extraction.skipped_short, 0);
    }

    #[test]
    fn test_keyword_column_and_short_rows() {
        let raw = "post_id,title,comment\np1,Title,nice\np2,only two\np3,Title,\"multi\nline\"\n";
        let extraction = extract_comments(raw, Category::Keyword);

        assert_eq!(extraction.comments.len(), 2);
        assert_eq!(extraction.comments[1].text, "multi\nline");
        assert_eq!(extraction.skipped_short, 1);
        assert_eq!(extraction.skipped(), 1);
    }

    #[test]
    fn test_stray_quote_stays_in_its_row() {
        // An inch mark must not swallow the following rows
        let raw = "id,comment\n1,my 27\" monitor is great\n2,good\n3,bad\n4,fine\n";
        let extraction = extract_comments(raw, Category::Post);

        let texts: Vec<&str> = extraction.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["my 27\" monitor is great", "good", "bad", "fine"]);
        assert_eq!(extraction.comments[3].row, 4);
        assert_eq!(extraction.skipped(), 0);
    }

    #[test]
    fn test_header_only() {
        let extraction = extract_comments("id,comment\n", Category::Post);
        assert!(extraction.comments.is_empty());
        assert_eq!(extraction.skipped(), 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_comments(&temp_dir.path().join("nope.csv"), Category::Post)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::NotFound(_)));
    }
}
