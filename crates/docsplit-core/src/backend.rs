use thiserror::Error;

use crate::PageRange;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("failed to export pages: {0}")]
    ExportError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened PDF: random-access pages with text extraction and verbatim copy.
///
/// The boundary detector only reads [`page_text`](Self::page_text); the
/// segment assembler only calls [`export_pages`](Self::export_pages).
pub trait PdfSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of the page at `index` (zero-based), lines separated by `\n`.
    ///
    /// Pages without a text layer return an empty string.
    fn page_text(&self, index: usize) -> Result<String, BackendError>;

    /// Build a standalone PDF containing exactly the pages in `pages`, in order.
    fn export_pages(&self, pages: PageRange) -> Result<Vec<u8>, BackendError>;
}

/// Trait for PDF backends.
///
/// Implementors open raw PDF bytes into a [`PdfSource`]; detection and
/// assembly live in `docsplit-parsing` and never touch the PDF library.
pub trait PdfBackend: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfSource>, BackendError>;
}
