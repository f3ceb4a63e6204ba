use docsplit_core::{PdfSource, ProgressEvent, Section};

use crate::config::DetectionConfig;
use crate::strategy::HeaderStrategy;

/// Return the first header among the first `max_lines` lines of `text`.
pub fn find_header_in_page(
    text: &str,
    strategy: &dyn HeaderStrategy,
    max_lines: usize,
) -> Option<String> {
    text.split('\n')
        .take(max_lines)
        .find_map(|line| strategy.match_header(line))
}

/// Scan every page in order and return the pages where a new section starts.
///
/// - Only the first [`DetectionConfig::max_header_lines`] lines of a page are
///   inspected, and the first matching line wins.
/// - A header equal to the last emitted label is a continuation, not a new
///   section. Headerless and unreadable pages leave that label untouched.
/// - A page whose text cannot be extracted is treated as headerless.
///
/// An empty result means nothing matched; callers report it as a failure.
pub fn detect_sections(
    source: &dyn PdfSource,
    strategy: &dyn HeaderStrategy,
    config: &DetectionConfig,
    progress: impl Fn(ProgressEvent),
) -> Vec<Section> {
    let total = source.page_count();
    let mut sections: Vec<Section> = Vec::new();
    let mut last_label: Option<String> = None;

    tracing::info!(pages = total, strategy = strategy.name(), "analyzing document for section headers");

    for page in 0..total {
        progress(ProgressEvent::Scanning { page, total });

        let text = match source.page_text(page) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = page + 1, error = %e, "text extraction failed, treating page as headerless");
                progress(ProgressEvent::PageUnreadable {
                    page,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let Some(label) = find_header_in_page(&text, strategy, config.max_header_lines) else {
            tracing::debug!(page = page + 1, "no header");
            continue;
        };

        if last_label.as_deref() == Some(label.as_str()) {
            tracing::debug!(page = page + 1, label = %label, "same header as previous section, continuing");
            progress(ProgressEvent::Continuation { page, label });
            continue;
        }

        tracing::info!(page = page + 1, label = %label, "found new section");
        progress(ProgressEvent::SectionFound {
            page,
            label: label.clone(),
        });
        sections.push(Section::new(page, label.clone()));
        last_label = Some(label);
    }

    if sections.is_empty() {
        tracing::warn!(pages = total, strategy = strategy.name(), "no section headers found");
    } else {
        tracing::info!(sections = sections.len(), "analysis complete");
    }

    sections
}
