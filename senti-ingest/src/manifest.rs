//! CSV manifests
//!
//! One quoting convention is used for reading and writing: a field containing
//! `,`, `"`, CR or LF is wrapped in double quotes with inner quotes doubled;
//! every other field is written bare. Rows end with `\n`.

use crate::error::{IngestError, IngestResult};

/// Header of processed manifests
pub const PROCESSED_HEADER: [&str; 2] = ["Preprocessed_Comment", "Sentiment"];

/// In-memory tabular artifact: a header row plus data rows of equal width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Manifest {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the header
    pub fn push_row<I, S>(&mut self, row: I) -> IngestResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.header.len() {
            return Err(IngestError::InvalidInput(format!(
                "row has {} fields, header has {}",
                row.len(),
                self.header.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize header then rows
    pub fn to_csv_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for row in std::iter::once(&self.header).chain(self.rows.iter()) {
            let line: Vec<String> = row.iter().map(|f| escape_field(f)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        out.into_bytes()
    }
}

/// Quote a field if it contains a separator, quote or line break
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into records of unquoted fields
///
/// Quoted fields may span lines. A `"` inside an unquoted field is kept as
/// text. `\r\n` and `\n` both end a record. Blank lines produce no record.
pub fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // Quotes only open a field; a `"` anywhere else is literal text
    let mut field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
                field_start = true;
            }
            _ => {
                field.push(c);
                field_start = false;
            }
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}
