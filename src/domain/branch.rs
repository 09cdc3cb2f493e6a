use std::fmt;

use crate::domain::version::Version;
use crate::error::{FlowError, Result};

/// The part a branch plays in the release workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Trunk,
    Integration,
    Feature,
    Release,
    Hotfix,
}

impl Role {
    /// Lower-case role name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            Role::Trunk => "trunk",
            Role::Integration => "integration",
            Role::Feature => "feature",
            Role::Release => "release",
            Role::Hotfix => "hotfix",
        }
    }

    /// Feature, release and hotfix branches come and go; trunk and integration don't.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Role::Feature | Role::Release | Role::Hotfix)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed branch identifier.
///
/// `qualifier` holds the feature name or version string and is `None` only
/// for the trunk and integration singletons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    pub role: Role,
    pub qualifier: Option<String>,
}

impl BranchRef {
    pub fn trunk() -> Self {
        BranchRef {
            role: Role::Trunk,
            qualifier: None,
        }
    }

    pub fn integration() -> Self {
        BranchRef {
            role: Role::Integration,
            qualifier: None,
        }
    }

    pub fn feature(name: impl Into<String>) -> Self {
        BranchRef {
            role: Role::Feature,
            qualifier: Some(name.into()),
        }
    }

    pub fn release(version: &Version) -> Self {
        BranchRef {
            role: Role::Release,
            qualifier: Some(version.to_string()),
        }
    }

    pub fn hotfix(version: &Version) -> Self {
        BranchRef {
            role: Role::Hotfix,
            qualifier: Some(version.to_string()),
        }
    }

    /// Extract the version carried by a release or hotfix qualifier.
    ///
    /// Qualifiers are free-form when parsed, so this is where a malformed
    /// version is rejected, before it can end up in a tag.
    pub fn version(&self) -> Result<Version> {
        match (self.role, self.qualifier.as_deref()) {
            (Role::Release | Role::Hotfix, Some(qualifier)) => Version::parse(qualifier),
            _ => Err(FlowError::version(format!(
                "{} branches do not carry a version",
                self.role
            ))),
        }
    }
}

/// Branch naming conventions: the two singleton names and the role prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchNaming {
    pub trunk: String,
    pub integration: String,
    pub feature: String,
    pub release: String,
    pub hotfix: String,
}

impl Default for BranchNaming {
    fn default() -> Self {
        BranchNaming {
            trunk: "main".to_string(),
            integration: "develop".to_string(),
            feature: "feature".to_string(),
            release: "release".to_string(),
            hotfix: "hotfix".to_string(),
        }
    }
}

impl BranchNaming {
    /// Prefix for a parameterized role, `None` for the singletons
    pub fn prefix(&self, role: Role) -> Option<&str> {
        match role {
            Role::Feature => Some(&self.feature),
            Role::Release => Some(&self.release),
            Role::Hotfix => Some(&self.hotfix),
            Role::Trunk | Role::Integration => None,
        }
    }

    /// Classify a raw branch name.
    ///
    /// The trunk and integration names must match exactly. Anything else is
    /// split on the first `/` and the left segment must be a role prefix
    /// followed by a non-empty qualifier.
    pub fn parse(&self, raw: &str) -> Result<BranchRef> {
        let raw = raw.trim();

        if raw == self.trunk {
            return Ok(BranchRef::trunk());
        }
        if raw == self.integration {
            return Ok(BranchRef::integration());
        }

        if let Some((head, rest)) = raw.split_once('/') {
            for role in [Role::Feature, Role::Release, Role::Hotfix] {
                if self.prefix(role) == Some(head) && !rest.is_empty() {
                    return Ok(BranchRef {
                        role,
                        qualifier: Some(rest.to_string()),
                    });
                }
            }
        }

        Err(FlowError::UnrecognizedBranch(raw.to_string()))
    }

    /// Canonical string form of a branch reference
    pub fn render(&self, branch: &BranchRef) -> String {
        match branch.role {
            Role::Trunk => self.trunk.clone(),
            Role::Integration => self.integration.clone(),
            role => format!(
                "{}/{}",
                self.prefix(role).unwrap_or_default(),
                branch.qualifier.as_deref().unwrap_or_default()
            ),
        }
    }

    /// Remove redundant leading `<prefix>/` segments for `role`.
    ///
    /// Every leading copy is removed, so applying it twice changes nothing.
    pub fn strip_role_prefix<'a>(&self, raw: &'a str, role: Role) -> &'a str {
        let raw = raw.trim();
        let Some(prefix) = self.prefix(role) else {
            return raw;
        };

        let mut rest = raw;
        while let Some(stripped) = rest.strip_prefix(prefix).and_then(|s| s.strip_prefix('/')) {
            rest = stripped;
        }
        rest
    }

    /// Role of a raw branch name, if it has one
    pub fn role_of(&self, raw: &str) -> Option<Role> {
        self.parse(raw).ok().map(|branch| branch.role)
    }
}
