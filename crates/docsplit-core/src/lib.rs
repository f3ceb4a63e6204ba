use std::fmt;
use std::ops::RangeInclusive;

pub mod backend;
pub mod config_file;
pub mod sanitize;
pub mod sink;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, PdfSource};
pub use sanitize::{MAX_FILE_STEM_CHARS, sanitize_file_stem};
pub use sink::{EntrySink, SinkError};

/// A detected boundary: the first page of one logical sub-document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Zero-based index of the page bearing this section's header.
    pub start_page: usize,
    /// The exact matched header text (trimmed).
    pub header_label: String,
}

impl Section {
    pub fn new(start_page: usize, header_label: impl Into<String>) -> Self {
        Self {
            start_page,
            header_label: header_label.into(),
        }
    }
}

/// Inclusive range of zero-based page indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    /// Create a range. `end` is clamped up to `start` so the range is never empty.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false; a `PageRange` holds at least one page.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

/// Displays as 1-based page numbers, e.g. `pages 3-6`.
impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "page {}", self.start + 1)
        } else {
            write!(f, "pages {}-{}", self.start + 1, self.end + 1)
        }
    }
}

/// A section materialized as a page range with an output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub header_label: String,
    pub pages: PageRange,
    /// Filesystem-safe stem derived from `header_label`.
    pub file_stem: String,
}

impl Segment {
    /// Entry name for this segment, e.g. `Account _ 100 - Alice.pdf`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem, extension)
    }
}

/// Trace of the decisions made while splitting a document.
///
/// Delivered to an optional caller callback; the same information is also
/// logged through `tracing`. Not part of the data contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A page is about to be examined (`page` is zero-based).
    Scanning { page: usize, total: usize },
    /// A header with a new label starts a section on `page`.
    SectionFound { page: usize, label: String },
    /// A header identical to the previous one; the page continues the current section.
    Continuation { page: usize, label: String },
    /// Text extraction failed; the page is treated as headerless.
    PageUnreadable { page: usize, error: String },
    /// A PDF segment was exported.
    SegmentWritten {
        index: usize,
        total: usize,
        file_name: String,
        pages: PageRange,
    },
    /// A spreadsheet or word-processing document was produced.
    DocumentWritten { file_name: String, detail: String },
}
