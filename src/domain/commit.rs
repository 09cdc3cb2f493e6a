use std::sync::OnceLock;

use regex::Regex;

/// Parsed representation of a conventional commit message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub r#type: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

fn header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?(!?):\s*(.*)").expect("static regex is valid")
    })
}

impl ParsedCommit {
    /// Parse the header line of a commit message.
    ///
    /// Accepts `type(scope)!: description` with scope and `!` optional.
    /// Anything else is treated as a `chore`. A `!` marker or one of the
    /// `breaking_indicators` anywhere in the message marks a breaking change.
    pub fn parse(message: &str, breaking_indicators: &[String]) -> Self {
        let header = message.lines().next().unwrap_or_default();
        let footer_breaking = breaking_indicators
            .iter()
            .any(|indicator| message.contains(indicator.as_str()));

        match header_pattern().captures(header) {
            Some(captures) => ParsedCommit {
                r#type: captures[1].to_string(),
                scope: captures.get(2).map(|m| m.as_str().to_string()),
                description: captures[4].to_string(),
                is_breaking_change: &captures[3] == "!" || footer_breaking,
            },
            None => ParsedCommit {
                r#type: "chore".to_string(),
                scope: None,
                description: header.to_string(),
                is_breaking_change: footer_breaking,
            },
        }
    }
}
