use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use crate::error::{FlowError, Result};

/// Semantic version representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Create a new version
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version {
            major,
            minor,
            patch,
        }
    }

    /// Parse version from a string (e.g., "v1.2.3" -> Version(1,2,3))
    ///
    /// At most one `v`/`V` prefix is accepted and every component must be
    /// plain digits below `u32::MAX`, so a bump can never overflow.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let clean = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        let parts: Vec<&str> = clean.split('.').collect();
        if parts.len() != 3 {
            return Err(FlowError::version(format!(
                "Invalid version format: '{}' - expected X.Y.Z",
                text
            )));
        }

        Ok(Version {
            major: parse_component("major", parts[0])?,
            minor: parse_component("minor", parts[1])?,
            patch: parse_component("patch", parts[2])?,
        })
    }

    /// Bump version according to a commit-analysis result
    pub fn bump(&self, bump_type: &VersionBump) -> Self {
        match bump_type {
            VersionBump::Major => Version::new(self.major.saturating_add(1), 0, 0),
            VersionBump::Minor => Version::new(self.major, self.minor.saturating_add(1), 0),
            VersionBump::Patch => {
                Version::new(self.major, self.minor, self.patch.saturating_add(1))
            }
        }
    }
}

fn parse_component(name: &str, text: &str) -> Result<u32> {
    let invalid = || FlowError::version(format!("Invalid {} version: '{}'", name, text));
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    match text.parse::<u32>() {
        Ok(value) if value < u32::MAX => Ok(value),
        _ => Err(invalid()),
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Version bump derived from commit messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

/// How a new release or hotfix version is derived from the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpMode {
    /// Hotfix: patch + 1
    PatchIncrement,
    /// Release default: the calculated version as-is
    PatchPreserve,
    /// Release `--major`: major + 1, minor and patch reset
    MajorIncrement,
    /// Release `--date`: YYYYMM.D.0
    DateBased,
}

impl BumpMode {
    /// Mode for a new release branch; the date flag wins over the major flag.
    pub fn for_release(major: bool, use_date: bool) -> Self {
        if use_date {
            BumpMode::DateBased
        } else if major {
            BumpMode::MajorIncrement
        } else {
            BumpMode::PatchPreserve
        }
    }
}

/// Compute the version for a new release or hotfix branch.
///
/// Pure: `DateBased` ignores `current` and only looks at `today`.
pub fn next_version(current: Version, mode: BumpMode, today: NaiveDate) -> Version {
    match mode {
        BumpMode::PatchIncrement => current.bump(&VersionBump::Patch),
        BumpMode::PatchPreserve => current,
        BumpMode::MajorIncrement => current.bump(&VersionBump::Major),
        BumpMode::DateBased => Version::new(
            today.year() as u32 * 100 + today.month(),
            today.day(),
            0,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_version_parse() {
        let v = Version::parse("v1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!("V0.1.0".parse::<Version>().unwrap(), Version::new(0, 1, 0));
    }

    #[test]
    fn test_version_parse_invalid() {
        for text in ["1.2", "v1.2.3.4", "1.x.3", "-1.2.3", "", "next"] {
            assert!(Version::parse(text).is_err(), "'{}' should not parse", text);
        }
    }

    #[test]
    fn test_version_parse_rejects_loose_forms() {
        for text in ["vv1.2.3", "vV1.2.3", "+1.4.3", "1.+4.3", "1..3", "1.0.4294967295"] {
            assert!(Version::parse(text).is_err(), "'{}' should not parse", text);
        }
        assert_eq!(
            Version::parse("1.0.4294967294").unwrap(),
            Version::new(1, 0, u32::MAX - 1)
        );
    }

    #[test]
    fn test_bump_at_upper_bound_does_not_overflow() {
        let today = date(2024, 3, 7);
        let top = Version::new(u32::MAX, 0, u32::MAX);
        assert_eq!(top.bump(&VersionBump::Major).major, u32::MAX);
        assert_eq!(top.bump(&VersionBump::Patch).patch, u32::MAX);
        assert_eq!(
            next_version(top, BumpMode::PatchIncrement, today),
            Version::new(u32::MAX, 0, u32::MAX)
        );
        assert_eq!(
            next_version(top, BumpMode::MajorIncrement, today),
            Version::new(u32::MAX, 0, 0)
        );
    }

    #[test]
    fn test_version_ordering() {
        assert!(Version::new(1, 10, 0) > Version::new(1, 9, 9));
        assert!(Version::new(2, 0, 0) > Version::new(1, 99, 99));
        assert!(Version::new(1, 0, 1) > Version::new(1, 0, 0));
    }

    #[test]
    fn test_version_bump() {
        let v = Version::new(1, 2, 3);
        assert_eq!(v.bump(&VersionBump::Major), Version::new(2, 0, 0));
        assert_eq!(v.bump(&VersionBump::Minor), Version::new(1, 3, 0));
        assert_eq!(v.bump(&VersionBump::Patch), Version::new(1, 2, 4));
    }

    #[test]
    fn test_next_version_modes() {
        let today = date(2024, 3, 7);
        let current = Version::new(2, 1, 5);

        assert_eq!(
            next_version(current, BumpMode::PatchIncrement, today),
            Version::new(2, 1, 6)
        );
        assert_eq!(next_version(current, BumpMode::PatchPreserve, today), current);
        assert_eq!(
            next_version(current, BumpMode::MajorIncrement, today),
            Version::new(3, 0, 0)
        );
        assert_eq!(
            next_version(current, BumpMode::DateBased, today),
            Version::new(202403, 7, 0)
        );
    }

    #[test]
    fn test_date_based_ignores_current() {
        let today = date(2025, 12, 31);
        let a = next_version(Version::new(0, 0, 1), BumpMode::DateBased, today);
        let b = next_version(Version::new(999, 9, 9), BumpMode::DateBased, today);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "202512.31.0");
    }

    #[test]
    fn test_next_version_is_repeatable() {
        let today = date(2024, 1, 1);
        let current = Version::new(1, 4, 2);
        for mode in [
            BumpMode::PatchIncrement,
            BumpMode::PatchPreserve,
            BumpMode::MajorIncrement,
            BumpMode::DateBased,
        ] {
            assert_eq!(
                next_version(current, mode, today),
                next_version(current, mode, today)
            );
        }
    }

    #[test]
    fn test_bump_mode_for_release() {
        assert_eq!(BumpMode::for_release(false, false), BumpMode::PatchPreserve);
        assert_eq!(BumpMode::for_release(true, false), BumpMode::MajorIncrement);
        assert_eq!(BumpMode::for_release(false, true), BumpMode::DateBased);
        assert_eq!(BumpMode::for_release(true, true), BumpMode::DateBased);
    }
}
