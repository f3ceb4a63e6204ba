use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("archive error: {0}")]
    Archive(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for generated documents, one named entry each.
///
/// Entry names are not deduplicated by callers; what happens on a repeated
/// name is up to the implementation.
pub trait EntrySink {
    fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError>;
}

/// Collects entries in insertion order, keeping duplicates.
impl EntrySink for Vec<(String, Vec<u8>)> {
    fn add_entry(&mut self, name: &str, bytes: Vec<u8>) -> Result<(), SinkError> {
        self.push((name.to_string(), bytes));
        Ok(())
    }
}
