use thiserror::Error;

use crate::domain::Role;

/// Unified error type for git-flow operations
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Unrecognized branch name: '{0}'")]
    UnrecognizedBranch(String),

    #[error("Cannot determine which {role} branch to use: current branch is '{current}'")]
    AmbiguousTarget { role: Role, current: String },

    #[error("Version unavailable: {0}")]
    VersionUnavailable(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Conflicting strategy: {0}")]
    ConflictingStrategy(String),

    #[error("No implicit update source for {0}; pass the source branch explicitly")]
    NoImplicitSource(String),

    #[error("Conflict while reconciling from '{branch}':\n{details}")]
    Conflict { branch: String, details: String },

    #[error("Branch '{0}' is not fully merged")]
    NotFullyMerged(String),

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Branch already exists: {0}")]
    BranchExists(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Push rejected: {0}")]
    Rejected(String),

    #[error("Git command failed: {0}")]
    Backend(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-flow
pub type Result<T> = std::result::Result<T, FlowError>;

impl FlowError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        FlowError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        FlowError::Version(msg.into())
    }

    /// Create a version-unavailable error with context
    pub fn version_unavailable(msg: impl Into<String>) -> Self {
        FlowError::VersionUnavailable(msg.into())
    }

    /// Create a backend error with context
    pub fn backend(msg: impl Into<String>) -> Self {
        FlowError::Backend(msg.into())
    }

    /// True when the error left the working tree mid-merge or mid-rebase.
    pub fn is_conflict(&self) -> bool {
        matches!(self, FlowError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FlowError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FlowError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_ambiguous_target_names_role_and_branch() {
        let err = FlowError::AmbiguousTarget {
            role: Role::Hotfix,
            current: "develop".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("hotfix"));
        assert!(msg.contains("develop"));
    }

    #[test]
    fn test_conflict_carries_details_verbatim() {
        let err = FlowError::Conflict {
            branch: "develop".to_string(),
            details: "CONFLICT (content): Merge conflict in src/lib.rs".to_string(),
        };
        assert!(err.is_conflict());
        assert!(err.to_string().contains("Merge conflict in src/lib.rs"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (FlowError::config("x"), "Configuration error"),
            (FlowError::version("x"), "Version parsing error"),
            (FlowError::version_unavailable("x"), "Version unavailable"),
            (FlowError::backend("x"), "Git command failed"),
            (FlowError::NotFullyMerged("x".to_string()), "Branch 'x'"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
            assert!(!err.is_conflict());
        }
    }
}
