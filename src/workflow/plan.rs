use std::fmt;

use crate::domain::ReconcileMethod;
use crate::git::PushTarget;

/// One backend operation in a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    Switch(String),
    Fetch(String),
    Reconcile {
        source: String,
        method: ReconcileMethod,
    },
    /// Always forced: re-running a completion re-creates the same tag
    Tag {
        name: String,
        message: String,
        target: Option<String>,
    },
    /// Cleanup delete: a missing branch is tolerated, an unmerged one is forced
    Delete(String),
    /// Runs only after the confirmation gate agrees
    Push {
        target: PushTarget,
        include_tags: bool,
        force: bool,
    },
}

impl FlowStep {
    /// Whether the step needs `branch` to exist
    fn reads(&self, branch: &str) -> bool {
        match self {
            FlowStep::Reconcile { source, .. } => source == branch,
            FlowStep::Delete(name) => name == branch,
            _ => false,
        }
    }
}

impl fmt::Display for FlowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowStep::Switch(branch) => write!(f, "switch to {}", branch),
            FlowStep::Fetch(branch) => write!(f, "fetch {}", branch),
            FlowStep::Reconcile { source, method } => write!(f, "{} {}", method, source),
            FlowStep::Tag { name, target, .. } => match target {
                Some(target) => write!(f, "tag {} as {}", target, name),
                None => write!(f, "tag HEAD as {}", name),
            },
            FlowStep::Delete(branch) => write!(f, "delete {}", branch),
            FlowStep::Push {
                target,
                include_tags,
                force,
            } => write!(
                f,
                "{}push {}{} (after confirmation)",
                if *force { "force-" } else { "" },
                target,
                if *include_tags { " with tags" } else { "" }
            ),
        }
    }
}

/// Ordered backend steps for a completion or an update.
///
/// Built up front, executed one step at a time, and discarded afterwards.
/// A failing step halts the plan; nothing already applied is rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionPlan {
    steps: Vec<FlowStep>,
}

impl CompletionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    /// The plan minus the steps that need `branch`, for re-running a
    /// completion whose source branch was already merged and deleted.
    pub fn without_source(&self, branch: &str) -> Self {
        CompletionPlan {
            steps: self
                .steps
                .iter()
                .filter(|step| !step.reads(branch))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotfix_plan() -> CompletionPlan {
        CompletionPlan::new()
            .then(FlowStep::Switch("main".to_string()))
            .then(FlowStep::Reconcile {
                source: "hotfix/1.4.3".to_string(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Switch("develop".to_string()))
            .then(FlowStep::Reconcile {
                source: "hotfix/1.4.3".to_string(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Delete("hotfix/1.4.3".to_string()))
            .then(FlowStep::Tag {
                name: "1.4.3".to_string(),
                message: "Hotfix 1.4.3".to_string(),
                target: Some("main".to_string()),
            })
    }

    fn rendered(plan: &CompletionPlan) -> Vec<String> {
        plan.steps().iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hotfix_plan_merges_the_hotfix_into_both_branches() {
        assert_eq!(
            rendered(&hotfix_plan()),
            vec![
                "switch to main",
                "merge --no-ff hotfix/1.4.3",
                "switch to develop",
                "merge --no-ff hotfix/1.4.3",
                "delete hotfix/1.4.3",
                "tag main as 1.4.3",
            ]
        );
    }

    #[test]
    fn test_without_source_keeps_the_rest_in_order() {
        let plan = hotfix_plan().without_source("hotfix/1.4.3");
        assert_eq!(
            rendered(&plan),
            vec!["switch to main", "switch to develop", "tag main as 1.4.3"]
        );
    }

    #[test]
    fn test_step_display() {
        let push = FlowStep::Push {
            target: PushTarget::All,
            include_tags: true,
            force: false,
        };
        assert_eq!(
            push.to_string(),
            "push all branches with tags (after confirmation)"
        );

        let reconcile = FlowStep::Reconcile {
            source: "hotfix/1.4.3".to_string(),
            method: ReconcileMethod::MergeNoFastForward,
        };
        assert_eq!(reconcile.to_string(), "merge --no-ff hotfix/1.4.3");
    }
}
