//! Version source: the current Major.Minor.Patch of a branch.

pub mod version_calculator;

pub use version_calculator::{CommitAnalyzer, GitVersionCalculator};

use std::sync::Mutex;

use crate::domain::Version;
use crate::error::{FlowError, Result};

/// Computes the version a branch currently stands at.
///
/// `VersionUnavailable` is an expected outcome (for example near the root
/// of history) and callers must treat it as "no trustworthy baseline".
pub trait VersionCalculator {
    fn compute_version(&self, branch: &str) -> Result<Version>;
}

/// Calculator returning a fixed answer, for tests and previews
pub struct MockVersionCalculator {
    version: Option<Version>,
    queried: Mutex<Vec<String>>,
}

impl MockVersionCalculator {
    pub fn returning(version: Version) -> Self {
        MockVersionCalculator {
            version: Some(version),
            queried: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        MockVersionCalculator {
            version: None,
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Branches the calculator was asked about, in order
    pub fn queried(&self) -> Vec<String> {
        self.queried
            .lock()
            .map(|q| q.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl VersionCalculator for MockVersionCalculator {
    fn compute_version(&self, branch: &str) -> Result<Version> {
        if let Ok(mut queried) = self.queried.lock() {
            queried.push(branch.to_string());
        }
        self.version.ok_or_else(|| {
            FlowError::version_unavailable(format!("no version could be computed for '{}'", branch))
        })
    }
}
