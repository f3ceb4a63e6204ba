use std::path::Path;

use thiserror::Error;

use docsplit_core::{PdfBackend, ProgressEvent, Segment, SinkError};
use docsplit_office::OfficeError;
use docsplit_parsing::{DetectionConfig, ParsingError, assemble, compute_segments, detect_sections};

pub mod archive;

// Re-export archive API
pub use archive::{ArchiveBuilder, ArchiveSummary, read_archive};

const PDF_HINT: &str = "ensure the PDF is text-based, not scanned, and that its pages carry the expected header";
const EXCEL_HINT: &str = "check that the column name matches the header row exactly";
const WORD_HINT: &str = "check that the delimiter text appears in the document";

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("input could not be read: {0}")]
    Unreadable(String),
    #[error("invalid split request: {0}")]
    InvalidRequest(String),
    #[error("no split points found: {reason} ({hint})")]
    NoBoundaries { reason: String, hint: &'static str },
    #[error("split points were found but no documents were produced")]
    ZeroOutput,
    #[error("failed to export document: {0}")]
    Export(String),
    #[error("failed to build archive: {0}")]
    Archive(#[from] SinkError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(not(feature = "pdf"))]
    #[error("PDF support not compiled in (enable the `pdf` feature of docsplit-ingest)")]
    NoPdfSupport,
}

impl SplitError {
    /// The input was valid but yielded nothing to split.
    pub fn is_no_match(&self) -> bool {
        matches!(self, SplitError::NoBoundaries { .. } | SplitError::ZeroOutput)
    }
}

impl From<ParsingError> for SplitError {
    fn from(e: ParsingError) -> Self {
        match e {
            ParsingError::Backend(e) => SplitError::Export(e.to_string()),
            ParsingError::Sink(e) => SplitError::Archive(e),
        }
    }
}

impl From<OfficeError> for SplitError {
    fn from(e: OfficeError) -> Self {
        let hint = match &e {
            OfficeError::DelimiterNotFound(_) => WORD_HINT,
            _ => EXCEL_HINT,
        };
        match e {
            OfficeError::Unreadable { .. } => SplitError::Unreadable(e.to_string()),
            OfficeError::Sink(e) => SplitError::Archive(e),
            OfficeError::EmptyDelimiter => SplitError::InvalidRequest(e.to_string()),
            e if e.is_no_match() => SplitError::NoBoundaries {
                reason: e.to_string(),
                hint,
            },
            e => SplitError::Export(e.to_string()),
        }
    }
}

/// What to split a file by.
#[derive(Debug, Clone)]
pub enum SplitRequest {
    /// Split a PDF wherever a new statement header starts.
    Pdf(DetectionConfig),
    /// Split the first worksheet by the values of a column.
    Excel { column: String },
    /// Split a Word document at paragraphs containing a delimiter.
    Word { delimiter: String },
}

/// The packaged result of one split.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// ZIP archive bytes.
    pub archive: Vec<u8>,
    /// Documents produced, counting ones later replaced by a same-named document.
    pub documents_created: usize,
    /// Distinct entries in the archive.
    pub entry_count: usize,
    pub entries: Vec<String>,
    pub overwritten: Vec<String>,
}

/// Name of the archive produced for `source_name`: `Split_<stem>.zip`.
pub fn archive_file_name(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "output".to_string());
    format!("Split_{stem}.zip")
}

/// Split an in-memory PDF into one document per detected section.
pub fn split_pdf_bytes(
    bytes: &[u8],
    backend: &dyn PdfBackend,
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    let source = backend
        .open(bytes)
        .map_err(|e| SplitError::Unreadable(e.to_string()))?;
    let strategy = config.strategy();

    let sections = detect_sections(source.as_ref(), strategy.as_ref(), config, &progress);
    if sections.is_empty() {
        return Err(SplitError::NoBoundaries {
            reason: format!(
                "no page matched the {} header rule in its first {} lines",
                strategy.name(),
                config.max_header_lines()
            ),
            hint: PDF_HINT,
        });
    }

    let mut archive = ArchiveBuilder::new();
    let created = assemble(source.as_ref(), &sections, &mut archive, &progress)?;
    package(archive, created)
}

/// Detect sections in an in-memory PDF and return the segments a split
/// would produce, without exporting anything.
pub fn plan_pdf_bytes(
    bytes: &[u8],
    backend: &dyn PdfBackend,
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Result<Vec<Segment>, SplitError> {
    let source = backend
        .open(bytes)
        .map_err(|e| SplitError::Unreadable(e.to_string()))?;
    let strategy = config.strategy();

    let sections = detect_sections(source.as_ref(), strategy.as_ref(), config, progress);
    if sections.is_empty() {
        return Err(SplitError::NoBoundaries {
            reason: format!("no page matched the {} header rule", strategy.name()),
            hint: PDF_HINT,
        });
    }
    Ok(compute_segments(&sections, source.page_count()))
}

/// Split a workbook by the values of `column`.
pub fn split_excel_bytes(
    bytes: &[u8],
    column: &str,
    progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    let mut archive = ArchiveBuilder::new();
    let created = docsplit_office::split_workbook(bytes, column, &mut archive, progress)?;
    package(archive, created)
}

/// Split a Word document at paragraphs containing `delimiter`.
pub fn split_word_bytes(
    bytes: &[u8],
    delimiter: &str,
    progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    let mut archive = ArchiveBuilder::new();
    let created = docsplit_office::split_docx(bytes, delimiter, &mut archive, progress)?;
    package(archive, created)
}

/// Read `path` and split it as `request` describes.
///
/// PDFs are opened with the MuPDF backend (requires the `pdf` feature).
pub fn split_file(
    path: &Path,
    request: &SplitRequest,
    progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    let bytes = std::fs::read(path)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "input loaded");

    match request {
        SplitRequest::Pdf(config) => split_pdf(&bytes, config, progress),
        SplitRequest::Excel { column } => split_excel_bytes(&bytes, column, progress),
        SplitRequest::Word { delimiter } => split_word_bytes(&bytes, delimiter, progress),
    }
}

/// Read a PDF from `path` and return its segment plan.
pub fn plan_file(
    path: &Path,
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Result<Vec<Segment>, SplitError> {
    let bytes = std::fs::read(path)?;
    plan_pdf(&bytes, config, progress)
}

#[cfg(feature = "pdf")]
fn split_pdf(
    bytes: &[u8],
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    let backend = docsplit_pdf_mupdf::MupdfBackend::default();
    split_pdf_bytes(bytes, &backend, config, progress)
}

#[cfg(not(feature = "pdf"))]
fn split_pdf(
    _bytes: &[u8],
    _config: &DetectionConfig,
    _progress: impl Fn(ProgressEvent),
) -> Result<SplitOutcome, SplitError> {
    Err(SplitError::NoPdfSupport)
}

#[cfg(feature = "pdf")]
fn plan_pdf(
    bytes: &[u8],
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Result<Vec<Segment>, SplitError> {
    let backend = docsplit_pdf_mupdf::MupdfBackend::default();
    plan_pdf_bytes(bytes, &backend, config, progress)
}

#[cfg(not(feature = "pdf"))]
fn plan_pdf(
    _bytes: &[u8],
    _config: &DetectionConfig,
    _progress: impl Fn(ProgressEvent),
) -> Result<Vec<Segment>, SplitError> {
    Err(SplitError::NoPdfSupport)
}

fn package(archive: ArchiveBuilder, created: usize) -> Result<SplitOutcome, SplitError> {
    if created == 0 {
        return Err(SplitError::ZeroOutput);
    }
    let (bytes, summary) = archive.finish()?;
    tracing::info!(
        documents = created,
        entries = summary.entries.len(),
        overwritten = summary.overwritten.len(),
        "archive ready"
    );

    Ok(SplitOutcome {
        archive: bytes,
        documents_created: created,
        entry_count: summary.entries.len(),
        entries: summary.entries,
        overwritten: summary.overwritten,
    })
}
