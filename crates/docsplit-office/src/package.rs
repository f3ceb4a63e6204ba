//! Reading and writing the ZIP container shared by `.xlsx` and `.docx`.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::OfficeError;

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Write `(part name, content)` pairs as a deflated ZIP package.
pub(crate) fn write_package(parts: &[(&str, String)]) -> Result<Vec<u8>, OfficeError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, content) in parts {
        writer
            .start_file(*name, options)
            .map_err(|e| OfficeError::Write(format!("{name}: {e}")))?;
        writer
            .write_all(content.as_bytes())
            .map_err(|e| OfficeError::Write(format!("{name}: {e}")))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| OfficeError::Write(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Read one part of a ZIP package as UTF-8 text.
pub(crate) fn read_part(
    bytes: &[u8],
    name: &str,
    format: &'static str,
) -> Result<String, OfficeError> {
    let unreadable = |reason: String| OfficeError::Unreadable { format, reason };

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| unreadable(format!("not a ZIP package: {e}")))?;
    let mut file = archive
        .by_name(name)
        .map_err(|_| unreadable(format!("missing {name}")))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| unreadable(format!("failed to read {name}: {e}")))?;
    Ok(content)
}

/// Escape text for an XML text node, dropping characters XML 1.0 forbids.
pub(crate) fn xml_text(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect();
    quick_xml::escape::escape(cleaned.as_str()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_round_trip() {
        let bytes = write_package(&[("a/b.xml", "<x/>".to_string())]).unwrap();
        assert_eq!(read_part(&bytes, "a/b.xml", "test").unwrap(), "<x/>");
    }

    #[test]
    fn missing_part_is_unreadable() {
        let bytes = write_package(&[("a.xml", String::new())]).unwrap();
        let err = read_part(&bytes, "b.xml", "test").unwrap_err();
        assert!(matches!(err, OfficeError::Unreadable { .. }));
    }

    #[test]
    fn garbage_is_unreadable() {
        let err = read_part(b"nope", "a.xml", "test").unwrap_err();
        assert!(matches!(err, OfficeError::Unreadable { format: "test", .. }));
    }

    #[test]
    fn xml_text_escapes_and_strips_controls() {
        assert_eq!(xml_text("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
        assert_eq!(xml_text("x\u{0007}y\tz"), "xy\tz");
    }
}
