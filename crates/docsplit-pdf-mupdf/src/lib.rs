use mupdf::TextPageFlags;
use mupdf::pdf::PdfDocument;

use docsplit_core::{BackendError, PageRange, PdfBackend, PdfSource};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so that detection and assembly do not transitively
/// depend on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for MupdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfSource>, BackendError> {
        let document =
            PdfDocument::from_bytes(bytes).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = usize::try_from(page_count)
            .map_err(|_| BackendError::OpenError(format!("invalid page count {page_count}")))?;

        tracing::debug!(pages = page_count, bytes = bytes.len(), "opened PDF");
        Ok(Box::new(MupdfSource {
            document,
            page_count,
        }))
    }
}

/// An opened PDF held entirely in memory.
struct MupdfSource {
    document: PdfDocument,
    page_count: usize,
}

fn page_number(index: usize) -> Result<i32, BackendError> {
    i32::try_from(index)
        .map_err(|_| BackendError::ExtractionError(format!("page {index} out of range")))
}

impl PdfSource for MupdfSource {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<String, BackendError> {
        let page = self
            .document
            .load_page(page_number(index)?)
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        // Block/line iteration keeps one extracted line per output line
        let mut page_text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let line_text: String = line
                    .chars()
                    .map(|c| c.char().unwrap_or('\u{FFFD}'))
                    .collect();
                page_text.push_str(&line_text);
                page_text.push('\n');
            }
        }
        Ok(page_text)
    }

    fn export_pages(&self, pages: PageRange) -> Result<Vec<u8>, BackendError> {
        if pages.end >= self.page_count {
            return Err(BackendError::ExportError(format!(
                "{} outside document of {} pages",
                pages, self.page_count
            )));
        }

        let export = |e: mupdf::Error| BackendError::ExportError(e.to_string());
        let mut output = PdfDocument::new();
        // One map for the whole range so shared fonts and images are copied once
        let mut map = output.new_graft_map().map_err(export)?;

        for from in pages.iter() {
            let source = self.document.find_page(page_number(from)?).map_err(export)?;

            let mut page = output.new_dict().map_err(export)?;
            let page_type = output.new_name("Page").map_err(export)?;
            page.dict_put("Type", page_type).map_err(export)?;
            for key in PAGE_KEYS {
                let value = if *key == "Contents" {
                    source.get_dict(*key)
                } else {
                    source.get_dict_inheritable(*key)
                }
                .map_err(export)?;
                if let Some(value) = value {
                    let grafted = map.graft_object(&value).map_err(export)?;
                    page.dict_put(*key, grafted).map_err(export)?;
                }
            }

            let page = output.add_object(&page).map_err(export)?;
            output.insert_page(-1, &page).map_err(export)?;
        }

        let mut buf = Vec::new();
        output.write_to(&mut buf).map_err(export)?;
        tracing::debug!(%pages, bytes = buf.len(), "exported pages");
        Ok(buf)
    }
}

/// Page entries carried into an exported page. `/Parent` is left out; the
/// page joins the new document's own page tree. All but `Contents` may be
/// inherited from an ancestor `Pages` node.
const PAGE_KEYS: &[&str] = &["Contents", "Resources", "MediaBox", "CropBox", "Rotate"];

#[cfg(test)]
mod tests {
    use super::*;

    /// A small uncompressed PDF with one `Account : N - Name` line per page.
    /// Resources and MediaBox live on the page tree root.
    fn account_pdf(names: &[&str]) -> Vec<u8> {
        let first_page = 4;
        let kids: Vec<String> = (0..names.len())
            .map(|i| format!("{} 0 R", first_page + 2 * i))
            .collect();

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> >>",
                kids.join(" "),
                names.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, name) in names.iter().enumerate() {
            let content = format!("BT /F1 12 Tf 72 720 Td (Account : {} - {name}) Tj ET", 100 + i);
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /Contents {} 0 R >>",
                first_page + 2 * i + 1
            ));
            objects.push(format!(
                "<< /Length {} >>\nstream\n{content}\nendstream",
                content.len()
            ));
        }

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{object}\nendobj\n", i + 1));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        ));
        pdf.into_bytes()
    }

    #[test]
    fn reads_page_text() {
        let source = MupdfBackend::new()
            .open(&account_pdf(&["Alice", "Bob", "Carol"]))
            .unwrap();
        assert_eq!(source.page_count(), 3);
        assert!(source.page_text(0).unwrap().contains("Account : 100 - Alice"));
        assert!(source.page_text(2).unwrap().contains("Account : 102 - Carol"));
    }

    #[test]
    fn exported_range_reopens_with_its_pages() {
        let backend = MupdfBackend::new();
        let source = backend.open(&account_pdf(&["Alice", "Bob", "Carol"])).unwrap();

        let exported = source.export_pages(PageRange::new(1, 2)).unwrap();
        let reopened = backend.open(&exported).unwrap();
        assert_eq!(reopened.page_count(), 2);
        assert!(reopened.page_text(0).unwrap().contains("Account : 101 - Bob"));
        assert!(reopened.page_text(1).unwrap().contains("Account : 102 - Carol"));
    }

    #[test]
    fn export_past_last_page_fails() {
        let source = MupdfBackend::new().open(&account_pdf(&["Alice"])).unwrap();
        let result = source.export_pages(PageRange::new(0, 1));
        assert!(matches!(result, Err(BackendError::ExportError(_))));
    }

    #[test]
    fn rejects_non_pdf_bytes() {
        let result = MupdfBackend::new().open(b"this is not a PDF at all");
        assert!(matches!(result, Err(BackendError::OpenError(_))));
    }
}
