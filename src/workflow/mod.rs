//! Branch lifecycle orchestration.
//!
//! [WorkflowController] turns the high-level commands (start, complete,
//! update, tag, ...) into ordered backend calls. Completions are first
//! built as a [CompletionPlan] and then executed step by step; the first
//! failing step halts the plan and whatever already ran stays in place.
//! Re-running the same completion picks up the remaining steps.

pub mod plan;

pub use plan::{CompletionPlan, FlowStep};

use chrono::{Local, NaiveDate};
use log::debug;

use crate::analyzer::VersionCalculator;
use crate::domain::{
    next_version, BranchNaming, BranchRef, BumpMode, ReconcileMethod, ReconcilePlan,
    RequestedMethod, Role, TagPattern, Version,
};
use crate::error::{FlowError, Result};
use crate::git::{Backend, PushTarget};
use crate::ui::{self, ConfirmGate};
use crate::warning::FlowWarning;

/// Result of a `complete_*` operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub branch: BranchRef,
    /// Tag created for releases and hotfixes
    pub tag: Option<String>,
    /// False when the operator declined the push
    pub pushed: bool,
    pub warnings: Vec<FlowWarning>,
}

/// Result of `reconcile`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub source: String,
    pub method: ReconcileMethod,
    pub pushed: bool,
    pub warnings: Vec<FlowWarning>,
}

#[derive(Debug, Default)]
struct Outcome {
    pushed: bool,
    warnings: Vec<FlowWarning>,
}

pub struct WorkflowController<'a, B: Backend, V: VersionCalculator, G: ConfirmGate> {
    backend: &'a B,
    calculator: &'a V,
    gate: &'a G,
    naming: BranchNaming,
    tags: TagPattern,
    remote: String,
    today: NaiveDate,
}

impl<'a, B: Backend, V: VersionCalculator, G: ConfirmGate> WorkflowController<'a, B, V, G> {
    pub fn new(backend: &'a B, calculator: &'a V, gate: &'a G, naming: BranchNaming) -> Self {
        WorkflowController {
            backend,
            calculator,
            gate,
            naming,
            tags: TagPattern::default(),
            remote: "origin".to_string(),
            today: Local::now().date_naive(),
        }
    }

    pub fn with_tag_pattern(mut self, tags: TagPattern) -> Self {
        self.tags = tags;
        self
    }

    /// Remote named in the manual push instructions
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Fix the date used by date-based release versions
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn naming(&self) -> &BranchNaming {
        &self.naming
    }

    pub fn backend(&self) -> &B {
        self.backend
    }

    /// Create `feature/<name>` from integration and switch to it.
    pub fn start_feature(&self, name: &str) -> Result<BranchRef> {
        let qualifier = self.naming.strip_role_prefix(name, Role::Feature).trim();
        if qualifier.is_empty() {
            return Err(FlowError::UnrecognizedBranch(name.to_string()));
        }

        let branch = BranchRef::feature(qualifier);
        let rendered = self.naming.render(&branch);
        self.backend.create_branch(&rendered, &self.naming.integration)?;
        self.backend.switch_branch(&rendered)?;
        Ok(branch)
    }

    /// Create `hotfix/<next patch>` from trunk and switch to it.
    pub fn start_hotfix(&self) -> Result<BranchRef> {
        let trunk = self.naming.trunk.clone();
        self.start_versioned(Role::Hotfix, &trunk, BumpMode::PatchIncrement)
    }

    /// Create `release/<version>` from integration and switch to it.
    ///
    /// The date scheme wins over `major` when both are requested.
    pub fn start_release(&self, major: bool, use_date: bool) -> Result<BranchRef> {
        let integration = self.naming.integration.clone();
        self.start_versioned(
            Role::Release,
            &integration,
            BumpMode::for_release(major, use_date),
        )
    }

    fn start_versioned(&self, role: Role, base: &str, mode: BumpMode) -> Result<BranchRef> {
        self.backend.switch_branch(base)?;

        let current = self
            .calculator
            .compute_version(base)
            .map_err(|e| match e {
                FlowError::VersionUnavailable(_) => e,
                other => FlowError::version_unavailable(other.to_string()),
            })?;
        let next = next_version(current, mode, self.today);
        debug!("{} {:?}: {} -> {}", base, mode, current, next);

        let branch = match role {
            Role::Hotfix => BranchRef::hotfix(&next),
            _ => BranchRef::release(&next),
        };
        let rendered = self.naming.render(&branch);
        ui::display_version_decision(&current, &next, &rendered);

        self.backend.create_branch(&rendered, base)?;
        self.backend.switch_branch(&rendered)?;
        Ok(branch)
    }

    /// Pick the branch a `complete_*` command operates on.
    ///
    /// An explicit name wins, with or without its role prefix. Otherwise the
    /// current branch is used if it has the expected role.
    pub fn resolve_ambiguous_target(
        &self,
        explicit: Option<&str>,
        current: &str,
        expected: Role,
    ) -> Result<BranchRef> {
        if let Some(raw) = explicit {
            let qualifier = self.naming.strip_role_prefix(raw, expected).trim();
            if qualifier.is_empty() {
                return Err(FlowError::UnrecognizedBranch(raw.to_string()));
            }
            return Ok(BranchRef {
                role: expected,
                qualifier: Some(qualifier.to_string()),
            });
        }

        match self.naming.parse(current) {
            Ok(branch) if branch.role == expected => Ok(branch),
            _ => Err(FlowError::AmbiguousTarget {
                role: expected,
                current: current.to_string(),
            }),
        }
    }

    pub fn complete_feature(&self, explicit: Option<&str>) -> Result<Completion> {
        let current = self.backend.current_branch()?;
        let branch = self.resolve_ambiguous_target(explicit, &current, Role::Feature)?;
        let rendered = self.naming.render(&branch);
        let integration = self.naming.integration.clone();

        let plan = CompletionPlan::new()
            .then(FlowStep::Switch(integration.clone()))
            .then(FlowStep::Reconcile {
                source: rendered.clone(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Delete(rendered.clone()))
            .then(FlowStep::Push {
                target: PushTarget::Branches(vec![integration]),
                include_tags: false,
                force: false,
            });

        self.run_completion(branch, &rendered, &self.naming.integration, plan, None)
    }

    /// Merge a hotfix into trunk and integration, tag trunk and push both.
    pub fn complete_hotfix(&self, explicit: Option<&str>) -> Result<Completion> {
        let current = self.backend.current_branch()?;
        let branch = self.resolve_ambiguous_target(explicit, &current, Role::Hotfix)?;
        let version = branch.version()?;
        let rendered = self.naming.render(&branch);
        let tag = self.tags.format(&version);
        let trunk = self.naming.trunk.clone();
        let integration = self.naming.integration.clone();

        let plan = CompletionPlan::new()
            .then(FlowStep::Switch(trunk.clone()))
            .then(FlowStep::Reconcile {
                source: rendered.clone(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Switch(integration.clone()))
            .then(FlowStep::Reconcile {
                source: rendered.clone(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Delete(rendered.clone()))
            .then(FlowStep::Tag {
                name: tag.clone(),
                message: format!("Hotfix {}", version),
                target: Some(trunk.clone()),
            })
            .then(FlowStep::Push {
                target: PushTarget::Branches(vec![trunk, integration]),
                include_tags: true,
                force: false,
            });

        self.run_completion(branch, &rendered, &self.naming.trunk, plan, Some(tag))
    }

    /// Merge a release into trunk, tag it, sync integration from trunk and
    /// push everything.
    pub fn complete_release(&self, explicit: Option<&str>) -> Result<Completion> {
        let current = self.backend.current_branch()?;
        let branch = self.resolve_ambiguous_target(explicit, &current, Role::Release)?;
        let version = branch.version()?;
        let rendered = self.naming.render(&branch);
        let tag = self.tags.format(&version);
        let trunk = self.naming.trunk.clone();

        let plan = CompletionPlan::new()
            .then(FlowStep::Switch(trunk.clone()))
            .then(FlowStep::Reconcile {
                source: rendered.clone(),
                method: ReconcileMethod::MergeNoFastForward,
            })
            .then(FlowStep::Tag {
                name: tag.clone(),
                message: format!("Release {}", version),
                target: Some(trunk.clone()),
            })
            .then(FlowStep::Switch(self.naming.integration.clone()))
            .then(FlowStep::Reconcile {
                source: trunk,
                method: ReconcileMethod::Merge,
            })
            .then(FlowStep::Delete(rendered.clone()))
            .then(FlowStep::Push {
                target: PushTarget::All,
                include_tags: true,
                force: false,
            });

        self.run_completion(branch, &rendered, &self.naming.trunk, plan, Some(tag))
    }

    /// Execute a completion plan.
    ///
    /// A missing source branch is only accepted when `merged_into` already
    /// records its merge, i.e. an earlier run got past the merge and the
    /// delete. Any other missing branch fails before the first step.
    fn run_completion(
        &self,
        branch: BranchRef,
        rendered: &str,
        merged_into: &str,
        plan: CompletionPlan,
        tag: Option<String>,
    ) -> Result<Completion> {
        let mut warnings = Vec::new();
        let plan = if self.backend.branch_exists(rendered)? {
            plan
        } else if self.backend.has_merged(rendered, merged_into)? {
            debug!("{} is gone but merged into {}, resuming", rendered, merged_into);
            warnings.push(FlowWarning::SourceAlreadyMerged {
                branch: rendered.to_string(),
            });
            plan.without_source(rendered)
        } else {
            return Err(FlowError::BranchNotFound(rendered.to_string()));
        };

        ui::display_plan(&format!("Completing {}", rendered), &plan);
        let outcome = self.execute(&plan)?;
        warnings.extend(outcome.warnings);

        Ok(Completion {
            branch,
            tag,
            pushed: outcome.pushed,
            warnings,
        })
    }

    fn execute(&self, plan: &CompletionPlan) -> Result<Outcome> {
        let mut outcome = Outcome::default();

        for step in plan.steps() {
            debug!("step: {}", step);
            match step {
                FlowStep::Switch(branch) => self.backend.switch_branch(branch)?,
                FlowStep::Fetch(branch) => self.backend.fetch_branch(branch)?,
                FlowStep::Reconcile { source, method } => self.backend.reconcile(*method, source)?,
                FlowStep::Tag {
                    name,
                    message,
                    target,
                } => self.backend.tag(name, message, target.as_deref(), true)?,
                FlowStep::Delete(branch) => {
                    if let Some(warning) = self.cleanup(branch)? {
                        outcome.warnings.push(warning);
                    }
                }
                FlowStep::Push {
                    target,
                    include_tags,
                    force,
                } => {
                    if self.gated_push(target, *include_tags, *force)? {
                        outcome.pushed = true;
                    } else {
                        outcome.warnings.push(FlowWarning::PushSkipped {
                            refs: target.to_string(),
                        });
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Delete a finished branch, tolerating one that is already gone
    fn cleanup(&self, branch: &str) -> Result<Option<FlowWarning>> {
        match self.backend.delete_branch(branch, false) {
            Ok(()) => Ok(None),
            Err(FlowError::BranchNotFound(_)) => Ok(Some(FlowWarning::BranchAlreadyDeleted {
                branch: branch.to_string(),
            })),
            Err(FlowError::NotFullyMerged(_)) => {
                self.backend.delete_branch(branch, true)?;
                Ok(Some(FlowWarning::ForcedDelete {
                    branch: branch.to_string(),
                }))
            }
            Err(e) => Err(e),
        }
    }

    fn gated_push(&self, target: &PushTarget, include_tags: bool, force: bool) -> Result<bool> {
        let prompt = if force {
            format!(
                "Force-push {} to {}? This rewrites the remote history.",
                target, self.remote
            )
        } else {
            format!(
                "Push {}{} to {}?",
                target,
                if include_tags { " with tags" } else { "" },
                self.remote
            )
        };

        if !self.gate.confirm(&prompt)? {
            let refs = match target {
                PushTarget::All => "--all".to_string(),
                PushTarget::Branches(branches) => branches.join(" "),
            };
            let refs = if force { format!("--force-with-lease {}", refs) } else { refs };
            ui::display_manual_push_instruction(&self.remote, &refs, include_tags);
            return Ok(false);
        }

        self.backend.push(target, include_tags, force)?;
        Ok(true)
    }

    /// Check out any branch
    pub fn switch_to(&self, name: &str) -> Result<()> {
        self.backend.switch_branch(name)
    }

    /// Delete a branch; failures are reported as they are
    pub fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        self.backend.delete_branch(name, force)
    }

    /// Bring a source branch into the current one.
    ///
    /// The source is the explicit branch or, when omitted, the natural parent
    /// of the current branch's role. The source is fetched first. After a
    /// clean rebase the current branch is force-pushed once confirmed.
    pub fn reconcile(
        &self,
        explicit_source: Option<&str>,
        requested: RequestedMethod,
        no_ff: bool,
    ) -> Result<Update> {
        let current = self.backend.current_branch()?;
        let current_role = self.naming.role_of(&current);
        let explicit = explicit_source
            .map(|raw| self.naming.parse(raw))
            .transpose()?;

        let reconcile = ReconcilePlan::resolve(current_role, explicit, requested, no_ff)?;
        let source = self.naming.render(&reconcile.source);
        if source == current {
            return Err(FlowError::NoImplicitSource(format!(
                "'{}' cannot be updated from itself",
                current
            )));
        }

        let mut plan = CompletionPlan::new()
            .then(FlowStep::Fetch(source.clone()))
            .then(FlowStep::Reconcile {
                source: source.clone(),
                method: reconcile.method,
            });
        if reconcile.requires_force_push() {
            plan = plan.then(FlowStep::Push {
                target: PushTarget::Branches(vec![current]),
                include_tags: false,
                force: true,
            });
        }

        let outcome = self.execute(&plan)?;
        Ok(Update {
            source,
            method: reconcile.method,
            pushed: outcome.pushed,
            warnings: outcome.warnings,
        })
    }

    /// Tag HEAD with a version, returning the tag name
    pub fn tag(&self, version: &str, message: Option<&str>, force: bool) -> Result<String> {
        let version = Version::parse(version)?;
        let name = self.tags.format(&version);
        let message = message
            .map(|m| m.to_string())
            .unwrap_or_else(|| format!("Version {}", version));

        self.backend.tag(&name, &message, None, force)?;
        Ok(name)
    }

    /// Stage the resolved conflicts and continue the rebase
    pub fn resume_rebase(&self) -> Result<()> {
        self.backend.stage_all()?;
        self.backend.continue_rebase()
    }
}
