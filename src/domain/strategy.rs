//! Update strategy: where a branch is synchronized from and how.

use std::fmt;

use crate::domain::branch::{BranchRef, Role};
use crate::error::{FlowError, Result};

/// Reconciliation method requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedMethod {
    Rebase,
    Merge,
}

/// Reconciliation method applied by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMethod {
    Rebase,
    Merge,
    MergeNoFastForward,
}

impl fmt::Display for ReconcileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReconcileMethod::Rebase => "rebase",
            ReconcileMethod::Merge => "merge",
            ReconcileMethod::MergeNoFastForward => "merge --no-ff",
        })
    }
}

/// Branch a role is synchronized from when no source is given.
///
/// An explicit source always wins. Trunk, integration and unrecognized
/// branches have no implicit source.
pub fn resolve_source(
    current_role: Option<Role>,
    explicit: Option<BranchRef>,
) -> Result<BranchRef> {
    if let Some(source) = explicit {
        return Ok(source);
    }

    match current_role {
        Some(Role::Hotfix) => Ok(BranchRef::trunk()),
        Some(Role::Feature) | Some(Role::Release) => Ok(BranchRef::integration()),
        Some(role) => Err(FlowError::NoImplicitSource(format!("{} branches", role))),
        None => Err(FlowError::NoImplicitSource(
            "branches outside the workflow".to_string(),
        )),
    }
}

/// Map the operator's request onto a concrete method.
///
/// A rebase cannot be combined with the no-fast-forward flag.
pub fn resolve_method(
    requested: RequestedMethod,
    no_fast_forward: bool,
) -> Result<ReconcileMethod> {
    match (requested, no_fast_forward) {
        (RequestedMethod::Rebase, true) => Err(FlowError::ConflictingStrategy(
            "--rebase cannot be combined with --no-ff".to_string(),
        )),
        (RequestedMethod::Rebase, false) => Ok(ReconcileMethod::Rebase),
        (RequestedMethod::Merge, true) => Ok(ReconcileMethod::MergeNoFastForward),
        (RequestedMethod::Merge, false) => Ok(ReconcileMethod::Merge),
    }
}

/// A resolved update: which branch to pull from and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub source: BranchRef,
    pub target_role: Option<Role>,
    pub method: ReconcileMethod,
}

impl ReconcilePlan {
    /// Resolve method first so conflicting flags are rejected even when the
    /// source could not be resolved.
    pub fn resolve(
        target_role: Option<Role>,
        explicit_source: Option<BranchRef>,
        requested: RequestedMethod,
        no_fast_forward: bool,
    ) -> Result<Self> {
        let method = resolve_method(requested, no_fast_forward)?;
        let source = resolve_source(target_role, explicit_source)?;
        Ok(ReconcilePlan {
            source,
            target_role,
            method,
        })
    }

    /// A successful rebase rewrites the branch, so it has to be force-pushed.
    pub fn requires_force_push(&self) -> bool {
        self.method == ReconcileMethod::Rebase
    }
}
