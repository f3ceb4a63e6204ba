use thiserror::Error;

pub mod assembler;
pub mod boundary;
pub mod config;
pub mod strategy;

pub use assembler::{assemble, compute_segments};
pub use boundary::{detect_sections, find_header_in_page};
pub use config::{DEFAULT_MAX_HEADER_LINES, DetectionConfig, DetectionConfigBuilder};
pub use strategy::{AccountHeaderStrategy, HeaderStrategy, RegexHeaderStrategy};
// Re-export domain types from core (canonical definitions live there)
pub use docsplit_core::{
    BackendError, EntrySink, PageRange, PdfSource, ProgressEvent, Section, Segment, SinkError,
};

#[derive(Error, Debug)]
pub enum ParsingError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("output error: {0}")]
    Sink(#[from] SinkError),
}
