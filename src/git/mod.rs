//! Version-control backend abstraction
//!
//! The workflow never talks to git directly. Every side effect goes through
//! the [Backend] trait, which has two implementations:
//!
//! - [cli::GitCli]: drives the `git` executable and echoes each command
//! - [mock::MockBackend]: an in-memory recorder for tests
//!
//! Backend calls report outcomes only. Failures are mapped onto the
//! [crate::error::FlowError] variants the workflow reacts to (`Conflict`,
//! `NotFullyMerged`, `BranchNotFound`, `Network`, `Rejected`, ...).

pub mod cli;
pub mod mock;

pub use cli::GitCli;
pub use mock::{MockBackend, Operation};

use std::fmt;

use crate::domain::ReconcileMethod;
use crate::error::Result;

/// What a push sends to the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// Every local branch
    All,
    /// The named branches only
    Branches(Vec<String>),
}

impl fmt::Display for PushTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushTarget::All => f.write_str("all branches"),
            PushTarget::Branches(branches) => f.write_str(&branches.join(", ")),
        }
    }
}

/// Operations the workflow needs from version control
///
/// ## Error Handling
///
/// Implementations must report the expected failure outcomes with the
/// matching error variant so the workflow can decide whether to halt,
/// escalate or carry on:
///
/// - `switch_branch`: `BranchNotFound`
/// - `fetch_branch`: `Network` or `Rejected`; a branch missing on the remote is not an error
/// - `reconcile`, `continue_rebase`: `Conflict` with the backend's output verbatim
/// - `create_branch`: `BranchExists`
/// - `delete_branch`: `NotFullyMerged` (non-force) or `BranchNotFound`
/// - `push`: `Rejected` or `Network`
pub trait Backend: Send + Sync {
    /// Name of the checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// Whether a local branch with this name exists
    fn branch_exists(&self, name: &str) -> Result<bool>;

    /// Whether `into` contains a merge commit for `source`
    ///
    /// Recognizes the default message of `git merge`, so it still answers
    /// after `source` itself has been deleted.
    fn has_merged(&self, source: &str, into: &str) -> Result<bool>;

    /// Check out a branch, fast-forwarding it from its upstream if it has one
    fn switch_branch(&self, name: &str) -> Result<()>;

    /// Update the local branch from the same-named branch on the remote
    ///
    /// The remote-tracking ref is always refreshed. The local branch is only
    /// moved when that is a fast-forward; a local branch that is ahead or has
    /// diverged is left alone for the following merge or rebase.
    fn fetch_branch(&self, name: &str) -> Result<()>;

    /// Bring `source` into the checked-out branch
    ///
    /// A conflicting merge or rebase is left in progress for the operator
    /// to resolve.
    fn reconcile(&self, method: ReconcileMethod, source: &str) -> Result<()>;

    /// Create `name` pointing at `from` without checking it out
    fn create_branch(&self, name: &str, from: &str) -> Result<()>;

    /// Delete a local branch; without `force`, unmerged branches are refused
    fn delete_branch(&self, name: &str, force: bool) -> Result<()>;

    /// Create an annotated tag on `target` (HEAD when `None`)
    ///
    /// With `force` an existing tag of the same name is replaced.
    fn tag(&self, name: &str, message: &str, target: Option<&str>, force: bool) -> Result<()>;

    /// Push branches, optionally followed by all tags
    fn push(&self, target: &PushTarget, include_tags: bool, force: bool) -> Result<()>;

    /// Stage every change in the working tree
    fn stage_all(&self) -> Result<()>;

    /// Continue an interrupted rebase
    fn continue_rebase(&self) -> Result<()>;
}
