use once_cell::sync::Lazy;
use regex::Regex;

/// Decides whether a line starts a new section and what its label is.
///
/// The boundary detector only asks this question; everything about page
/// ranges, continuation, and naming is independent of the rule in use.
pub trait HeaderStrategy: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Return the header label if `line` carries a header.
    fn match_header(&self, line: &str) -> Option<String>;
}

/// The built-in rule for intermediary transaction statements:
/// `Account : <number/code> - <client name>`, case-insensitive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountHeaderStrategy;

static ACCOUNT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Account\s*:\s*[\w\d\s-]+\s+-\s+.*").unwrap());

impl HeaderStrategy for AccountHeaderStrategy {
    fn name(&self) -> &str {
        "account"
    }

    fn match_header(&self, line: &str) -> Option<String> {
        let label = ACCOUNT_HEADER_RE.find(line)?.as_str().trim();
        (!label.is_empty()).then(|| label.to_string())
    }
}

/// A header rule supplied as a regex.
///
/// If the pattern has a named group `label`, that group is the label;
/// otherwise the whole match is. Either way the label is trimmed, and an
/// empty label is not a header.
#[derive(Debug, Clone)]
pub struct RegexHeaderStrategy {
    re: Regex,
}

impl RegexHeaderStrategy {
    pub fn new(re: Regex) -> Self {
        Self { re }
    }

    pub fn from_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::new)
    }

    pub fn pattern(&self) -> &str {
        self.re.as_str()
    }
}

impl HeaderStrategy for RegexHeaderStrategy {
    fn name(&self) -> &str {
        "regex"
    }

    fn match_header(&self, line: &str) -> Option<String> {
        let caps = self.re.captures(line)?;
        let m = caps.name("label").or_else(|| caps.get(0))?;
        let label = m.as_str().trim();
        (!label.is_empty()).then(|| label.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_header_basic() {
        let s = AccountHeaderStrategy;
        assert_eq!(
            s.match_header("Account : 100 - Alice").as_deref(),
            Some("Account : 100 - Alice")
        );
    }

    #[test]
    fn account_header_case_and_spacing() {
        let s = AccountHeaderStrategy;
        assert_eq!(
            s.match_header("ACCOUNT:  4471 XQ-2 - Jane Doe Ltd").as_deref(),
            Some("ACCOUNT:  4471 XQ-2 - Jane Doe Ltd")
        );
        assert_eq!(
            s.match_header("account :12 - bob").as_deref(),
            Some("account :12 - bob")
        );
    }

    #[test]
    fn account_header_match_starts_at_keyword_and_is_trimmed() {
        let s = AccountHeaderStrategy;
        assert_eq!(
            s.match_header("Statement for Account : 300 AB - Carol Smith   \r").as_deref(),
            Some("Account : 300 AB - Carol Smith")
        );
    }

    #[test]
    fn account_header_rejects_lines_without_separator() {
        let s = AccountHeaderStrategy;
        assert_eq!(s.match_header("Account : 100 Alice"), None);
        assert_eq!(s.match_header("Account 100 - Alice"), None);
        // Hyphen must be surrounded by whitespace
        assert_eq!(s.match_header("Account : 100-Alice"), None);
        assert_eq!(s.match_header("Opening balance 1,200.00"), None);
        assert_eq!(s.match_header(""), None);
    }

    #[test]
    fn regex_strategy_uses_label_group() {
        let s = RegexHeaderStrategy::from_pattern(r"Client\s+No\.\s*(?P<label>\d+)").unwrap();
        assert_eq!(s.match_header("Client No. 0042 page 1").as_deref(), Some("0042"));
        assert_eq!(s.match_header("no client here"), None);
    }

    #[test]
    fn regex_strategy_whole_match_without_group() {
        let s = RegexHeaderStrategy::from_pattern(r"(?i)portfolio\s+\w+").unwrap();
        assert_eq!(
            s.match_header("  Portfolio Alpha summary").as_deref(),
            Some("Portfolio Alpha")
        );
    }

    #[test]
    fn regex_strategy_empty_label_is_no_match() {
        let s = RegexHeaderStrategy::from_pattern(r"Name:(?P<label>\s*)").unwrap();
        assert_eq!(s.match_header("Name:   "), None);
    }

    #[test]
    fn regex_strategy_invalid_pattern() {
        assert!(RegexHeaderStrategy::from_pattern("[unclosed").is_err());
    }
}
