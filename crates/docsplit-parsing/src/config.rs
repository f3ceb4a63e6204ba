use regex::Regex;

use crate::strategy::{AccountHeaderStrategy, HeaderStrategy, RegexHeaderStrategy};

/// Headers are expected near the top of a page; body text below this many
/// lines is never inspected.
pub const DEFAULT_MAX_HEADER_LINES: usize = 15;

/// Configuration for the boundary detector.
///
/// `header_re` is `None` for the built-in `Account : ... - ...` rule.
/// Use [`DetectionConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub(crate) header_re: Option<Regex>,
    pub(crate) max_header_lines: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            header_re: None,
            max_header_lines: DEFAULT_MAX_HEADER_LINES,
        }
    }
}

impl DetectionConfig {
    /// Number of leading lines inspected per page.
    pub fn max_header_lines(&self) -> usize {
        self.max_header_lines
    }

    /// The custom header pattern, if one was configured.
    pub fn header_pattern(&self) -> Option<&str> {
        self.header_re.as_ref().map(|re| re.as_str())
    }

    /// The header rule this config selects.
    pub fn strategy(&self) -> Box<dyn HeaderStrategy> {
        match &self.header_re {
            Some(re) => Box::new(RegexHeaderStrategy::new(re.clone())),
            None => Box::new(AccountHeaderStrategy),
        }
    }
}

/// Builder for [`DetectionConfig`].
///
/// Accepts a string pattern that is compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if the pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct DetectionConfigBuilder {
    header_re: Option<String>,
    max_header_lines: Option<usize>,
}

impl DetectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_regex(mut self, pattern: &str) -> Self {
        self.header_re = Some(pattern.to_string());
        self
    }

    /// Lines inspected per page. Zero is treated as one.
    pub fn max_header_lines(mut self, n: usize) -> Self {
        self.max_header_lines = Some(n);
        self
    }

    pub fn build(self) -> Result<DetectionConfig, regex::Error> {
        let header_re = self.header_re.map(|p| Regex::new(&p)).transpose()?;
        Ok(DetectionConfig {
            header_re,
            max_header_lines: self
                .max_header_lines
                .unwrap_or(DEFAULT_MAX_HEADER_LINES)
                .max(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.max_header_lines(), 15);
        assert!(config.header_pattern().is_none());
        assert_eq!(config.strategy().name(), "account");
    }

    #[test]
    fn test_builder_basic() {
        let config = DetectionConfigBuilder::new()
            .max_header_lines(30)
            .build()
            .unwrap();
        assert_eq!(config.max_header_lines(), 30);
    }

    #[test]
    fn test_builder_zero_lines_clamped() {
        let config = DetectionConfigBuilder::new()
            .max_header_lines(0)
            .build()
            .unwrap();
        assert_eq!(config.max_header_lines(), 1);
    }

    #[test]
    fn test_builder_custom_regex() {
        let config = DetectionConfigBuilder::new()
            .header_regex(r"(?i)Konto\s*:\s*(?P<label>.+)")
            .build()
            .unwrap();
        assert_eq!(config.header_pattern(), Some(r"(?i)Konto\s*:\s*(?P<label>.+)"));
        let strategy = config.strategy();
        assert_eq!(strategy.name(), "regex");
        assert_eq!(
            strategy.match_header("Konto: 991 Meyer").as_deref(),
            Some("991 Meyer")
        );
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = DetectionConfigBuilder::new().header_regex(r"[invalid").build();
        assert!(result.is_err());
    }
}
