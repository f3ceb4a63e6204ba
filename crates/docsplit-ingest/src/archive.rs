use std::io::{Cursor, Read, Write};

use docsplit_core::{EntrySink, SinkError};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// What ended up in a finished archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Entry names in the order they were first added.
    pub entries: Vec<String>,
    /// Names that were added more than once, once per replacement.
    pub overwritten: Vec<String>,
}

/// In-memory staging area for split documents, written out as one ZIP.
///
/// Adding a name that already exists replaces the earlier bytes (last write
/// wins); the entry keeps its original position.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
    overwritten: Vec<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, bytes: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => {
                tracing::warn!(entry = name, "duplicate entry name, replacing earlier document");
                entry.1 = bytes;
                self.overwritten.push(name.to_string());
            }
            None => self.entries.push((name.to_string(), bytes)),
        }
    }

    /// Number of distinct entries staged so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write all staged entries as a deflated ZIP.
    pub fn finish(self) -> Result<(Vec<u8>, ArchiveSummary), SinkError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, bytes) in &self.entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| SinkError::Archive(format!("{name}: {e}")))?;
            writer.write_all(bytes)?;
        }
        let cursor = writer
            .finish()
            .map_err(|e| SinkError::Archive(e.to_string()))?;

        let summary = ArchiveSummary {
            entries: self.entries.into_iter().map(|(name, _)| name).collect(),
            overwritten: self.overwritten,
        };
        Ok((cursor.into_inner(), summary))
    }
}

impl EntrySink for ArchiveBuilder {
    fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError> {
        self.add(name, bytes);
        Ok(())
    }
}

/// Read every file entry of a ZIP archive into memory, in archive order.
pub fn read_archive(data: &[u8]) -> Result<Vec<(String, Vec<u8>)>, SinkError> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| SinkError::Archive(format!("failed to open ZIP: {e}")))?;

    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| SinkError::Archive(format!("failed to read ZIP entry: {e}")))?;
        if file.is_dir() {
            continue;
        }
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        out.push((file.name().to_string(), buf));
    }
    Ok(out)
}
