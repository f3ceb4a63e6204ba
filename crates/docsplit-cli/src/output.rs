use std::io::Write;
use std::path::Path;

use docsplit_core::{ProgressEvent, Segment};
use docsplit_ingest::SplitOutcome;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a real-time progress event.
///
/// Per-page scanning is only logged; printing it would drown the useful lines.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::Scanning { .. } => {}
        ProgressEvent::SectionFound { page, label } => {
            if color.enabled() {
                writeln!(w, "Page {}: {} {}", page + 1, "new section".green(), label)?;
            } else {
                writeln!(w, "Page {}: new section {}", page + 1, label)?;
            }
        }
        ProgressEvent::Continuation { page, label } => {
            if color.enabled() {
                writeln!(w, "{}", format!("Page {}: continues {}", page + 1, label).dimmed())?;
            } else {
                writeln!(w, "Page {}: continues {}", page + 1, label)?;
            }
        }
        ProgressEvent::PageUnreadable { page, error } => {
            if color.enabled() {
                writeln!(
                    w,
                    "{} page {} could not be read ({}); kept with the surrounding section",
                    "WARNING:".yellow(),
                    page + 1,
                    error
                )?;
            } else {
                writeln!(
                    w,
                    "WARNING: page {} could not be read ({}); kept with the surrounding section",
                    page + 1,
                    error
                )?;
            }
        }
        ProgressEvent::SegmentWritten {
            index,
            total,
            file_name,
            pages,
        } => {
            writeln!(w, "[{}/{}] {} ({})", index + 1, total, file_name, pages)?;
        }
        ProgressEvent::DocumentWritten { file_name, detail } => {
            writeln!(w, "Created {} ({})", file_name, detail)?;
        }
    }
    Ok(())
}

/// Print the section plan produced by `docsplit detect`.
pub fn print_plan(
    w: &mut dyn Write,
    source_name: &str,
    segments: &[Segment],
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", format!("Sections in {}", source_name).bold())?;
    } else {
        writeln!(w, "Sections in {}", source_name)?;
    }

    let width = segments
        .iter()
        .map(|s| s.pages.to_string().len())
        .max()
        .unwrap_or(0);
    for (i, segment) in segments.iter().enumerate() {
        writeln!(
            w,
            "{:>3}. {:<width$}  {}",
            i + 1,
            segment.pages.to_string(),
            segment.file_name("pdf"),
            width = width
        )?;
    }
    writeln!(w, "{} documents would be created", segments.len())?;
    Ok(())
}

/// Print the final summary after an archive is written.
pub fn print_summary(
    w: &mut dyn Write,
    outcome: &SplitOutcome,
    archive_path: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "Split complete".bold().green())?;
    } else {
        writeln!(w, "Split complete")?;
    }
    writeln!(w, "  Documents created: {}", outcome.documents_created)?;
    writeln!(w, "  Archive entries:   {}", outcome.entry_count)?;

    if !outcome.overwritten.is_empty() {
        let msg = format!(
            "  {} document(s) replaced an earlier one with the same name: {}",
            outcome.overwritten.len(),
            outcome.overwritten.join(", ")
        );
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    writeln!(w, "  Saved to {}", archive_path.display())?;
    Ok(())
}
