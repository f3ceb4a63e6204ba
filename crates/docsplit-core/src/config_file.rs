use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub detection: Option<DetectionSection>,
    pub output: Option<OutputSection>,
    pub excel: Option<ExcelSection>,
    pub word: Option<WordSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionSection {
    /// Regex replacing the built-in `Account : <id> - <name>` header rule.
    pub header_pattern: Option<String>,
    /// Number of leading lines inspected per page.
    pub max_header_lines: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Directory the archive is written to (defaults to the input's directory).
    pub directory: Option<String>,
    /// Disable colored terminal output.
    pub no_color: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcelSection {
    pub column: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordSection {
    pub delimiter: Option<String>,
}

/// Platform config directory path: `<config_dir>/docsplit/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsplit").join("config.toml"))
}

/// Load config by cascading CWD `.docsplit.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".docsplit.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        detection: Some(DetectionSection {
            header_pattern: overlay
                .detection
                .as_ref()
                .and_then(|d| d.header_pattern.clone())
                .or_else(|| {
                    base.detection
                        .as_ref()
                        .and_then(|d| d.header_pattern.clone())
                }),
            max_header_lines: overlay
                .detection
                .as_ref()
                .and_then(|d| d.max_header_lines)
                .or_else(|| base.detection.as_ref().and_then(|d| d.max_header_lines)),
        }),
        output: Some(OutputSection {
            directory: overlay
                .output
                .as_ref()
                .and_then(|o| o.directory.clone())
                .or_else(|| base.output.as_ref().and_then(|o| o.directory.clone())),
            no_color: overlay
                .output
                .as_ref()
                .and_then(|o| o.no_color)
                .or_else(|| base.output.as_ref().and_then(|o| o.no_color)),
        }),
        excel: Some(ExcelSection {
            column: overlay
                .excel
                .as_ref()
                .and_then(|e| e.column.clone())
                .or_else(|| base.excel.as_ref().and_then(|e| e.column.clone())),
        }),
        word: Some(WordSection {
            delimiter: overlay
                .word
                .as_ref()
                .and_then(|w| w.delimiter.clone())
                .or_else(|| base.word.as_ref().and_then(|w| w.delimiter.clone())),
        }),
    }
}
