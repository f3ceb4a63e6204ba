use docsplit_core::{
    EntrySink, PageRange, PdfSource, ProgressEvent, Section, Segment, sanitize_file_stem,
};

use crate::ParsingError;

/// Turn ordered sections into page ranges that partition `[0, num_pages - 1]`.
///
/// Each segment runs from its section's start page to the page before the
/// next section starts; the last one runs to the end of the document. Pages
/// before the first header (cover sheets, unreadable pages) are absorbed
/// into the first segment, so every page lands in exactly one segment.
pub fn compute_segments(sections: &[Section], num_pages: usize) -> Vec<Segment> {
    if num_pages == 0 {
        return Vec::new();
    }
    let last_page = num_pages - 1;

    sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.start_page <= last_page)
        .map(|(i, section)| {
            let end = match sections.get(i + 1) {
                Some(next) => next.start_page.saturating_sub(1).min(last_page),
                None => last_page,
            };
            let start = if i == 0 { 0 } else { section.start_page };
            Segment {
                header_label: section.header_label.clone(),
                pages: PageRange::new(start, end),
                file_stem: sanitize_file_stem(&section.header_label),
            }
        })
        .collect()
}

/// Export one PDF per section into `sink`, in section order.
///
/// Entry names are `<sanitized label>.pdf` and are not deduplicated; the sink
/// decides what a repeated name means. Returns the number of documents
/// created. Any export or sink failure aborts the run.
pub fn assemble(
    source: &dyn PdfSource,
    sections: &[Section],
    sink: &mut dyn EntrySink,
    progress: impl Fn(ProgressEvent),
) -> Result<usize, ParsingError> {
    let segments = compute_segments(sections, source.page_count());
    let total = segments.len();
    let mut created = 0;

    for (index, segment) in segments.iter().enumerate() {
        let file_name = segment.file_name("pdf");
        tracing::info!(file = %file_name, pages = %segment.pages, "creating segment");

        let bytes = source.export_pages(segment.pages)?;
        sink.add_entry(&file_name, bytes)?;
        created += 1;

        progress(ProgressEvent::SegmentWritten {
            index,
            total,
            file_name,
            pages: segment.pages,
        });
    }

    Ok(created)
}
