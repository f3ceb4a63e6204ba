//! DOCX splitting on a delimiter paragraph.
//!
//! Only body paragraph text is carried over; tables, images, and formatting
//! are not.

use quick_xml::Reader;
use quick_xml::events::Event;

use docsplit_core::{EntrySink, ProgressEvent};

use crate::OfficeError;
use crate::package::{XML_DECLARATION, read_part, write_package, xml_text};

/// Read the text of every body-level paragraph of a `.docx`, in order.
///
/// Only runs belonging to the paragraph itself (directly, or through a
/// hyperlink or tracked insertion) contribute text. Table cells, text boxes,
/// and paragraph properties such as tab stops are skipped. Tabs and line
/// breaks inside a run become `\t` and `\n`.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, OfficeError> {
    let xml = read_part(bytes, "word/document.xml", "Word")?;
    let malformed = |e: quick_xml::Error| OfficeError::Unreadable {
        format: "Word",
        reason: format!("malformed document.xml: {e}"),
    };

    let mut reader = Reader::from_str(&xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut paragraphs = Vec::new();
    // Stack index of the open body paragraph
    let mut open_paragraph: Option<usize> = None;
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match (name.as_slice(), open_paragraph) {
                    (b"p", None) if is_body(&stack) => {
                        open_paragraph = Some(stack.len());
                        current.clear();
                    }
                    (b"t", Some(depth)) if is_paragraph_run(&stack, depth) => in_text = true,
                    _ => {}
                }
                stack.push(name);
            }
            Event::End(e) => {
                stack.pop();
                match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" if open_paragraph == Some(stack.len()) => {
                        paragraphs.push(std::mem::take(&mut current));
                        open_paragraph = None;
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => match (e.local_name().as_ref(), open_paragraph) {
                (b"p", None) if is_body(&stack) => paragraphs.push(String::new()),
                (b"tab", Some(depth)) if is_paragraph_run(&stack, depth) => current.push('\t'),
                (b"br" | b"cr", Some(depth)) if is_paragraph_run(&stack, depth) => {
                    current.push('\n')
                }
                _ => {}
            },
            Event::Text(t) if in_text => {
                current.push_str(&t.unescape().unwrap_or_default());
            }
            Event::CData(t) if in_text => {
                current.push_str(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn is_body(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|parent| parent == b"body")
}

/// Whether the innermost open element is a run of the paragraph at
/// `paragraph_depth`, either its direct child or inside one hyperlink or
/// insertion wrapper.
fn is_paragraph_run(stack: &[Vec<u8>], paragraph_depth: usize) -> bool {
    if stack.last().map(Vec::as_slice) != Some(b"r".as_slice()) {
        return false;
    }
    let run_depth = stack.len() - 1;
    run_depth == paragraph_depth + 1
        || (run_depth == paragraph_depth + 2
            && matches!(stack[paragraph_depth + 1].as_slice(), b"hyperlink" | b"ins"))
}

/// Group paragraphs into documents.
///
/// Any paragraph containing `delimiter` starts a new document and is its
/// first paragraph. Paragraphs before the first delimiter belong to no
/// document. An empty result means the delimiter never occurred.
pub fn split_paragraphs(paragraphs: &[String], delimiter: &str) -> Vec<Vec<String>> {
    let mut documents = Vec::new();
    let mut current: Option<Vec<String>> = None;

    for paragraph in paragraphs {
        if paragraph.contains(delimiter) {
            if let Some(done) = current.take() {
                documents.push(done);
            }
            current = Some(Vec::new());
        }
        if let Some(doc) = current.as_mut() {
            doc.push(paragraph.clone());
        }
    }
    if let Some(done) = current {
        documents.push(done);
    }

    documents
}

/// Write a minimal `.docx` containing one plain paragraph per entry.
pub fn write_docx(paragraphs: &[String]) -> Result<Vec<u8>, OfficeError> {
    let mut body = String::new();
    for paragraph in paragraphs {
        if paragraph.is_empty() {
            body.push_str("<w:p/>");
        } else {
            body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
            body.push_str(&xml_text(paragraph));
            body.push_str("</w:t></w:r></w:p>");
        }
    }

    let document = format!(
        "{XML_DECLARATION}{}{body}{}",
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
        "<w:sectPr/></w:body></w:document>",
    );
    let content_types = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"</Types>"#,
        )
    );
    let root_rels = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"</Relationships>"#,
        )
    );

    write_package(&[
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", root_rels),
        ("word/document.xml", document),
    ])
}

/// Split a `.docx` into `Document_<n>.docx` files, `n` counting from 1.
///
/// Returns the number of files written to `sink`.
pub fn split_docx(
    bytes: &[u8],
    delimiter: &str,
    sink: &mut dyn EntrySink,
    progress: impl Fn(ProgressEvent),
) -> Result<usize, OfficeError> {
    if delimiter.is_empty() {
        return Err(OfficeError::EmptyDelimiter);
    }

    let paragraphs = read_paragraphs(bytes)?;
    tracing::info!(paragraphs = paragraphs.len(), "word document loaded");

    let documents = split_paragraphs(&paragraphs, delimiter);
    if documents.is_empty() {
        tracing::warn!(delimiter, "delimiter text was not found");
        return Err(OfficeError::DelimiterNotFound(delimiter.to_string()));
    }

    let mut created = 0;
    for (i, doc) in documents.iter().enumerate() {
        let file_name = format!("Document_{}.docx", i + 1);
        sink.add_entry(&file_name, write_docx(doc)?)?;
        created += 1;

        tracing::info!(file = %file_name, paragraphs = doc.len(), "saved document");
        progress(ProgressEvent::DocumentWritten {
            file_name,
            detail: format!("{} paragraphs", doc.len()),
        });
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paras(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn delimiter_paragraph_starts_document() {
        let docs = split_paragraphs(
            &paras(&[
                "Client Statement: Alice",
                "balance 10",
                "Client Statement: Bob",
                "balance 20",
                "footer",
            ]),
            "Client Statement",
        );
        assert_eq!(
            docs,
            vec![
                paras(&["Client Statement: Alice", "balance 10"]),
                paras(&["Client Statement: Bob", "balance 20", "footer"]),
            ]
        );
    }

    #[test]
    fn leading_content_is_discarded() {
        let docs = split_paragraphs(&paras(&["cover", "intro", "START 1", "x"]), "START");
        assert_eq!(docs, vec![paras(&["START 1", "x"])]);
    }

    #[test]
    fn no_delimiter_means_no_documents() {
        assert!(split_paragraphs(&paras(&["a", "b"]), "zzz").is_empty());
    }

    #[test]
    fn consecutive_delimiters_give_single_paragraph_documents() {
        let docs = split_paragraphs(&paras(&["D1", "D2", "D3"]), "D");
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.len() == 1));
    }

    #[test]
    fn written_docx_reads_back() {
        let written = paras(&["Hello <world> & co", "", "tab\there"]);
        let bytes = write_docx(&written).unwrap();
        assert_eq!(read_paragraphs(&bytes).unwrap(), written);
    }

    #[test]
    fn table_paragraphs_are_skipped() {
        let xml = format!(
            "{XML_DECLARATION}{}",
            concat!(
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
                r#"<w:p><w:r><w:t>before</w:t></w:r></w:p>"#,
                r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
                r#"<w:p><w:r><w:t>af</w:t></w:r><w:r><w:tab/><w:t>ter</w:t></w:r></w:p>"#,
                r#"</w:body></w:document>"#,
            )
        );
        let bytes = write_package(&[("word/document.xml", xml)]).unwrap();
        assert_eq!(read_paragraphs(&bytes).unwrap(), paras(&["before", "af\tter"]));
    }

    fn document_bytes(body: &str) -> Vec<u8> {
        let xml = format!(
            "{XML_DECLARATION}{}{body}</w:body></w:document>",
            concat!(
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" "#,
                r#"xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"><w:body>"#,
            )
        );
        write_package(&[("word/document.xml", xml)]).unwrap()
    }

    #[test]
    fn tab_stop_definitions_are_not_text() {
        let bytes = document_bytes(concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>Client A</w:t></w:r></w:p>"#,
        ));
        assert_eq!(read_paragraphs(&bytes).unwrap(), paras(&["Client A"]));
    }

    #[test]
    fn text_box_content_is_skipped() {
        let bytes = document_bytes(concat!(
            r#"<w:p><w:r><w:t>Intro</w:t></w:r><w:r><mc:AlternateContent>"#,
            r#"<mc:Choice Requires="wps"><w:drawing><wps:txbx><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>BOX</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></wps:txbx></w:drawing></mc:Choice>"#,
            r#"<mc:Fallback><w:pict><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>BOX</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></w:pict></mc:Fallback>"#,
            r#"</mc:AlternateContent></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Next</w:t></w:r></w:p>"#,
        ));
        assert_eq!(read_paragraphs(&bytes).unwrap(), paras(&["Intro", "Next"]));
    }

    #[test]
    fn hyperlink_and_inserted_runs_are_text() {
        let bytes = document_bytes(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r>"#,
            r#"<w:hyperlink><w:r><w:t>site</w:t></w:r></w:hyperlink>"#,
            r#"<w:ins><w:r><w:br/><w:t>added</w:t></w:r></w:ins></w:p>"#,
        ));
        assert_eq!(read_paragraphs(&bytes).unwrap(), paras(&["See site\nadded"]));
    }

    #[test]
    fn split_docx_names_documents_from_one() {
        let bytes = write_docx(&paras(&["junk", "Client A", "a1", "Client B", "b1"])).unwrap();
        let mut sink: Vec<(String, Vec<u8>)> = Vec::new();
        let created = split_docx(&bytes, "Client", &mut sink, |_| {}).unwrap();
        assert_eq!(created, 2);
        assert_eq!(sink[0].0, "Document_1.docx");
        assert_eq!(sink[1].0, "Document_2.docx");
        assert_eq!(read_paragraphs(&sink[1].1).unwrap(), paras(&["Client B", "b1"]));
    }

    #[test]
    fn split_docx_reports_missing_delimiter() {
        let bytes = write_docx(&paras(&["nothing here"])).unwrap();
        let mut sink: Vec<(String, Vec<u8>)> = Vec::new();
        let err = split_docx(&bytes, "Client", &mut sink, |_| {}).unwrap_err();
        assert!(matches!(err, OfficeError::DelimiterNotFound(_)));
        assert!(err.is_no_match());
        assert!(sink.is_empty());
    }

    #[test]
    fn split_docx_rejects_empty_delimiter() {
        let mut sink: Vec<(String, Vec<u8>)> = Vec::new();
        let err = split_docx(b"", "", &mut sink, |_| {}).unwrap_err();
        assert!(matches!(err, OfficeError::EmptyDelimiter));
    }
}
