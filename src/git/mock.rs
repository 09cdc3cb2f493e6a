use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::domain::ReconcileMethod;
use crate::error::{FlowError, Result};
use crate::git::{Backend, PushTarget};
use crate::ui::ConfirmGate;

/// One recorded backend call (or confirmation prompt)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Switch(String),
    Fetch(String),
    Reconcile {
        method: ReconcileMethod,
        source: String,
    },
    Create {
        name: String,
        from: String,
    },
    Delete {
        name: String,
        force: bool,
    },
    Tag {
        name: String,
        target: Option<String>,
        force: bool,
    },
    Push {
        target: PushTarget,
        include_tags: bool,
        force: bool,
    },
    StageAll,
    ContinueRebase,
    Confirm(String),
}

struct MockState {
    current: String,
    branches: BTreeSet<String>,
    tags: BTreeMap<String, String>,
    conflicts: HashMap<String, String>,
    unmerged: HashSet<String>,
    merged: HashSet<(String, String)>,
    fetch_fails: bool,
    push_rejected: bool,
    confirm: bool,
    operations: Vec<Operation>,
}

/// In-memory backend that records every call in order.
///
/// It also acts as the confirmation gate so prompts show up in the same
/// operation log as the backend calls around them.
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Repository with `main` and `develop`, `develop` checked out
    pub fn new() -> Self {
        MockBackend {
            state: Mutex::new(MockState {
                current: "develop".to_string(),
                branches: ["main", "develop"].iter().map(|s| s.to_string()).collect(),
                tags: BTreeMap::new(),
                conflicts: HashMap::new(),
                unmerged: HashSet::new(),
                merged: HashSet::new(),
                fetch_fails: false,
                push_rejected: false,
                confirm: true,
                operations: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a local branch
    pub fn with_branch(self, name: impl Into<String>) -> Self {
        self.state().branches.insert(name.into());
        self
    }

    /// Add a local branch and check it out
    pub fn on_branch(self, name: impl Into<String>) -> Self {
        let name = name.into();
        {
            let mut state = self.state();
            state.branches.insert(name.clone());
            state.current = name;
        }
        self
    }

    /// Reconciling from `source` reports a conflict
    pub fn with_conflict(self, source: impl Into<String>) -> Self {
        self.state().conflicts.insert(
            source.into(),
            "CONFLICT (content): Merge conflict in src/lib.rs".to_string(),
        );
        self
    }

    /// Non-force deletion of `name` is refused
    pub fn with_unmerged(self, name: impl Into<String>) -> Self {
        self.state().unmerged.insert(name.into());
        self
    }

    /// History of `into` already holds a merge of `source`
    pub fn with_merged(self, source: impl Into<String>, into: impl Into<String>) -> Self {
        self.state().merged.insert((source.into(), into.into()));
        self
    }

    pub fn with_failing_fetch(self) -> Self {
        self.state().fetch_fails = true;
        self
    }

    pub fn with_rejected_push(self) -> Self {
        self.state().push_rejected = true;
        self
    }

    /// Answer "no" at every confirmation gate
    pub fn declining_confirmation(self) -> Self {
        self.state().confirm = false;
        self
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    pub fn current(&self) -> String {
        self.state().current.clone()
    }

    pub fn has_branch(&self, name: &str) -> bool {
        self.state().branches.contains(name)
    }

    /// Tag name mapped to the branch it was created on
    pub fn tags(&self) -> BTreeMap<String, String> {
        self.state().tags.clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MockBackend {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.has_branch(name))
    }

    fn has_merged(&self, source: &str, into: &str) -> Result<bool> {
        Ok(self
            .state()
            .merged
            .contains(&(source.to_string(), into.to_string())))
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Switch(name.to_string()));
        if !state.branches.contains(name) {
            return Err(FlowError::BranchNotFound(name.to_string()));
        }
        state.current = name.to_string();
        Ok(())
    }

    fn fetch_branch(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Fetch(name.to_string()));
        if state.fetch_fails {
            return Err(FlowError::Network(format!(
                "fatal: unable to access remote for '{}'",
                name
            )));
        }
        Ok(())
    }

    fn reconcile(&self, method: ReconcileMethod, source: &str) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Reconcile {
            method,
            source: source.to_string(),
        });
        if !state.branches.contains(source) {
            return Err(FlowError::BranchNotFound(source.to_string()));
        }
        if let Some(details) = state.conflicts.get(source) {
            return Err(FlowError::Conflict {
                branch: source.to_string(),
                details: details.clone(),
            });
        }
        if method != ReconcileMethod::Rebase {
            let into = state.current.clone();
            state.merged.insert((source.to_string(), into));
        }
        Ok(())
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Create {
            name: name.to_string(),
            from: from.to_string(),
        });
        if state.branches.contains(name) {
            return Err(FlowError::BranchExists(name.to_string()));
        }
        if !state.branches.contains(from) {
            return Err(FlowError::BranchNotFound(from.to_string()));
        }
        state.branches.insert(name.to_string());
        Ok(())
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Delete {
            name: name.to_string(),
            force,
        });
        if !state.branches.contains(name) {
            return Err(FlowError::BranchNotFound(name.to_string()));
        }
        if !force && state.unmerged.contains(name) {
            return Err(FlowError::NotFullyMerged(name.to_string()));
        }
        state.branches.remove(name);
        Ok(())
    }

    fn tag(&self, name: &str, _message: &str, target: Option<&str>, force: bool) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Tag {
            name: name.to_string(),
            target: target.map(|t| t.to_string()),
            force,
        });
        if !force && state.tags.contains_key(name) {
            return Err(FlowError::backend(format!(
                "fatal: tag '{}' already exists",
                name
            )));
        }
        let on = target.map(|t| t.to_string()).unwrap_or_else(|| state.current.clone());
        state.tags.insert(name.to_string(), on);
        Ok(())
    }

    fn push(&self, target: &PushTarget, include_tags: bool, force: bool) -> Result<()> {
        let mut state = self.state();
        state.operations.push(Operation::Push {
            target: target.clone(),
            include_tags,
            force,
        });
        if state.push_rejected {
            return Err(FlowError::Rejected(format!(
                "! [rejected] {} (fetch first)",
                target
            )));
        }
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        self.state().operations.push(Operation::StageAll);
        Ok(())
    }

    fn continue_rebase(&self) -> Result<()> {
        self.state().operations.push(Operation::ContinueRebase);
        Ok(())
    }
}

impl ConfirmGate for MockBackend {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let mut state = self.state();
        state.operations.push(Operation::Confirm(prompt.to_string()));
        Ok(state.confirm)
    }
}
