use std::fmt;

/// Non-fatal conditions met while running a workflow step.
/// They are reported to the operator and the plan carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowWarning {
    /// The branch to delete is already gone, typically from an earlier partial run
    BranchAlreadyDeleted { branch: String },
    /// A cleanup delete was refused as unmerged and was retried with force
    ForcedDelete { branch: String },
    /// The source branch no longer exists, so the steps that read it were skipped
    SourceAlreadyMerged { branch: String },
    /// The operator declined the confirmation gate
    PushSkipped { refs: String },
}

impl fmt::Display for FlowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowWarning::BranchAlreadyDeleted { branch } => {
                write!(f, "Branch '{}' was already deleted", branch)
            }
            FlowWarning::ForcedDelete { branch } => {
                write!(
                    f,
                    "Branch '{}' was not fully merged upstream; deleted with force",
                    branch
                )
            }
            FlowWarning::SourceAlreadyMerged { branch } => {
                write!(
                    f,
                    "Branch '{}' no longer exists; skipping the steps that merge it",
                    branch
                )
            }
            FlowWarning::PushSkipped { refs } => {
                write!(f, "Push of {} skipped", refs)
            }
        }
    }
}
