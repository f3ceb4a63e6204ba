//! Splitters for formats whose boundaries are explicit.
//!
//! - Spreadsheets split on the distinct values of a named column.
//! - Word documents split wherever a paragraph contains a delimiter.
//!
//! Both read the whole input into memory and hand each generated document
//! to an [`EntrySink`](docsplit_core::EntrySink).

use thiserror::Error;

pub mod excel;
mod package;
pub mod word;

pub use excel::{Cell, Sheet, ValueGroup, group_rows_by_column, split_workbook};
pub use word::{read_paragraphs, split_docx, split_paragraphs, write_docx};

#[derive(Error, Debug)]
pub enum OfficeError {
    #[error("could not read {format} file: {reason}")]
    Unreadable {
        format: &'static str,
        reason: String,
    },
    #[error("worksheet is empty")]
    EmptySheet,
    #[error("column '{column}' not found; available columns: {}", .available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },
    #[error("column '{0}' has no values")]
    NoValues(String),
    #[error("delimiter must not be empty")]
    EmptyDelimiter,
    #[error("delimiter text '{0}' was not found in any paragraph")]
    DelimiterNotFound(String),
    #[error("failed to write document: {0}")]
    Write(String),
    #[error("output error: {0}")]
    Sink(#[from] docsplit_core::SinkError),
}

impl OfficeError {
    /// The input was readable but nothing in it marks a split point.
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            OfficeError::EmptySheet
                | OfficeError::ColumnNotFound { .. }
                | OfficeError::NoValues(_)
                | OfficeError::DelimiterNotFound(_)
        )
    }
}
