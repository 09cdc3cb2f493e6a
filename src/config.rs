use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::{BranchNaming, TagPattern, Version};
use crate::error::{FlowError, Result};

/// Represents the complete configuration for git-flow.
///
/// Contains branch naming, tag formatting, conventional commit settings,
/// versioning and behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub tags: TagsConfig,

    #[serde(default)]
    pub conventional_commits: ConventionalCommitsConfig,

    #[serde(default)]
    pub versioning: VersioningConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_trunk() -> String {
    "main".to_string()
}

fn default_integration() -> String {
    "develop".to_string()
}

fn default_feature_prefix() -> String {
    "feature".to_string()
}

fn default_release_prefix() -> String {
    "release".to_string()
}

fn default_hotfix_prefix() -> String {
    "hotfix".to_string()
}

/// Names of the singleton branches and prefixes of the parameterized ones.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_trunk")]
    pub trunk: String,

    #[serde(default = "default_integration")]
    pub integration: String,

    #[serde(default = "default_feature_prefix")]
    pub feature: String,

    #[serde(default = "default_release_prefix")]
    pub release: String,

    #[serde(default = "default_hotfix_prefix")]
    pub hotfix: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            trunk: default_trunk(),
            integration: default_integration(),
            feature: default_feature_prefix(),
            release: default_release_prefix(),
            hotfix: default_hotfix_prefix(),
        }
    }
}

fn default_tag_pattern() -> String {
    "{version}".to_string()
}

/// Tag naming.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TagsConfig {
    #[serde(default = "default_tag_pattern")]
    pub pattern: String,
}

impl Default for TagsConfig {
    fn default() -> Self {
        TagsConfig {
            pattern: default_tag_pattern(),
        }
    }
}

/// Returns the default list of conventional commit types.
fn default_commit_types() -> Vec<String> {
    [
        "feat", "fix", "docs", "style", "refactor", "test", "chore", "build", "ci", "perf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Returns the default list of breaking change indicators.
fn default_breaking_change_indicators() -> Vec<String> {
    vec![
        "BREAKING CHANGE:".to_string(),
        "BREAKING-CHANGE:".to_string(),
    ]
}

/// Keywords that force a major bump; none by default since breaking changes
/// are already flagged with `!` or a footer.
fn default_major_keywords() -> Vec<String> {
    Vec::new()
}

/// Returns the default list of keywords that trigger minor version bumps.
fn default_minor_keywords() -> Vec<String> {
    vec!["feature".to_string(), "enhancement".to_string()]
}

/// Configuration for conventional commit analysis.
///
/// Drives how the version calculator turns the commits made since the last
/// version tag into a bump.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConventionalCommitsConfig {
    #[serde(default = "default_commit_types")]
    pub types: Vec<String>,

    #[serde(default = "default_breaking_change_indicators")]
    pub breaking_change_indicators: Vec<String>,

    #[serde(default = "default_major_keywords")]
    pub major_keywords: Vec<String>,

    #[serde(default = "default_minor_keywords")]
    pub minor_keywords: Vec<String>,
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        ConventionalCommitsConfig {
            types: default_commit_types(),
            breaking_change_indicators: default_breaking_change_indicators(),
            major_keywords: default_major_keywords(),
            minor_keywords: default_minor_keywords(),
        }
    }
}

/// Version baseline used when no version tag is reachable.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct VersioningConfig {
    #[serde(default)]
    pub initial_version: Option<String>,
}

/// Configuration for behavior customization.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BehaviorConfig {
    /// Skip the confirmation gate before pushes
    #[serde(default)]
    pub assume_yes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote: default_remote(),
            branches: BranchesConfig::default(),
            tags: TagsConfig::default(),
            conventional_commits: ConventionalCommitsConfig::default(),
            versioning: VersioningConfig::default(),
            behavior: BehaviorConfig::default(),
        }
    }
}

impl Config {
    /// Branch naming conventions derived from the `[branches]` section
    pub fn naming(&self) -> BranchNaming {
        BranchNaming {
            trunk: self.branches.trunk.clone(),
            integration: self.branches.integration.clone(),
            feature: self.branches.feature.clone(),
            release: self.branches.release.clone(),
            hotfix: self.branches.hotfix.clone(),
        }
    }

    pub fn tag_pattern(&self) -> Result<TagPattern> {
        TagPattern::new(self.tags.pattern.clone())
    }

    pub fn initial_version(&self) -> Result<Option<Version>> {
        self.versioning
            .initial_version
            .as_deref()
            .map(Version::parse)
            .transpose()
    }

    /// Reject configurations the workflow cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.remote.trim().is_empty() {
            return Err(FlowError::config("remote must not be empty"));
        }

        let b = &self.branches;
        let names = [
            ("trunk", &b.trunk),
            ("integration", &b.integration),
            ("feature", &b.feature),
            ("release", &b.release),
            ("hotfix", &b.hotfix),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(FlowError::config(format!("branches.{} must not be empty", key)));
            }
        }
        if b.trunk == b.integration {
            return Err(FlowError::config(
                "trunk and integration must be different branches",
            ));
        }
        for (key, prefix) in &names[2..] {
            if prefix.contains('/') {
                return Err(FlowError::config(format!(
                    "branches.{} prefix must not contain '/'",
                    key
                )));
            }
        }
        if b.feature == b.release || b.feature == b.hotfix || b.release == b.hotfix {
            return Err(FlowError::config("branch prefixes must be distinct"));
        }

        self.tag_pattern()?;
        self.initial_version()?;
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitflow.toml` in current directory
/// 3. `~/.config/.gitflow.toml` in user config directory
/// 4. Default configuration if no file found
///
/// The loaded configuration is validated before it is returned.
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./gitflow.toml").exists() {
        fs::read_to_string("./gitflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".gitflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| FlowError::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
