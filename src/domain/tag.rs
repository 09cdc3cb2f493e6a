use regex::Regex;

use crate::domain::version::Version;
use crate::error::{FlowError, Result};

/// Tag naming pattern (e.g., "{version}", "v{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pattern: String,
    matcher: Regex,
}

impl TagPattern {
    /// Build a pattern; it must contain exactly one `{version}` placeholder.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        if pattern.matches("{version}").count() != 1 {
            return Err(FlowError::config(format!(
                "Tag pattern '{}' must contain exactly one {{version}} placeholder",
                pattern
            )));
        }

        let escaped = regex::escape(&pattern);
        let source = escaped.replace(r"\{version\}", r"(\d+\.\d+\.\d+)");
        let matcher = Regex::new(&format!("^{}$", source))
            .map_err(|e| FlowError::config(format!("Invalid tag pattern '{}': {}", pattern, e)))?;

        Ok(TagPattern { pattern, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=1.2.3 -> "v1.2.3"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }

    /// Version encoded in a tag name, if the tag follows this pattern
    pub fn extract_version(&self, tag: &str) -> Option<Version> {
        let captures = self.matcher.captures(tag)?;
        Version::parse(captures.get(1)?.as_str()).ok()
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern {
            pattern: "{version}".to_string(),
            matcher: Regex::new(r"^(\d+\.\d+\.\d+)$").expect("static regex is valid"),
        }
    }
}
