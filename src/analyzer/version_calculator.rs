use std::path::Path;

use git2::{Oid, Repository, Sort};
use log::debug;

use crate::analyzer::VersionCalculator;
use crate::config::ConventionalCommitsConfig;
use crate::domain::{ParsedCommit, TagPattern, Version, VersionBump};
use crate::error::{FlowError, Result};

/// Analyzes commit messages to determine version bump type
pub struct CommitAnalyzer {
    config: ConventionalCommitsConfig,
}

impl CommitAnalyzer {
    pub fn new(config: ConventionalCommitsConfig) -> Self {
        CommitAnalyzer { config }
    }

    fn mentions(&self, description: &str, keywords: &[String]) -> bool {
        let description = description.to_lowercase();
        keywords
            .iter()
            .any(|keyword| description.contains(&keyword.to_lowercase()))
    }

    /// Bump implied by a batch of commits; `None` when there are none.
    ///
    /// Breaking changes win, then features, then everything else as a patch.
    /// Types not listed in the configuration count as plain patches.
    pub fn analyze_messages(&self, messages: &[String]) -> Option<VersionBump> {
        if messages.is_empty() {
            return None;
        }

        let mut has_features = false;
        for message in messages {
            let parsed = ParsedCommit::parse(message, &self.config.breaking_change_indicators);
            let known_type = self.config.types.contains(&parsed.r#type);

            if parsed.is_breaking_change
                || self.mentions(&parsed.description, &self.config.major_keywords)
            {
                return Some(VersionBump::Major);
            }

            if (known_type && matches!(parsed.r#type.as_str(), "feat" | "feature"))
                || self.mentions(&parsed.description, &self.config.minor_keywords)
            {
                has_features = true;
            }
        }

        Some(if has_features {
            VersionBump::Minor
        } else {
            VersionBump::Patch
        })
    }
}

/// Version source backed by the repository's tags and history.
///
/// The baseline is the highest version tag reachable from the branch head.
/// Commits made after that tag are analyzed as conventional commits and the
/// resulting bump is applied; a branch sitting exactly on its tag reports the
/// tag's version unchanged.
pub struct GitVersionCalculator {
    repo: Repository,
    pattern: TagPattern,
    analyzer: CommitAnalyzer,
    initial_version: Option<Version>,
}

impl GitVersionCalculator {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(
        path: P,
        pattern: TagPattern,
        commits: ConventionalCommitsConfig,
    ) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Ok(Self::from_git2(repo, pattern, commits))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(
        repo: Repository,
        pattern: TagPattern,
        commits: ConventionalCommitsConfig,
    ) -> Self {
        GitVersionCalculator {
            repo,
            pattern,
            analyzer: CommitAnalyzer::new(commits),
            initial_version: None,
        }
    }

    /// Baseline used when no version tag is reachable
    pub fn with_initial_version(mut self, version: Option<Version>) -> Self {
        self.initial_version = version;
        self
    }

    fn branch_head(&self, branch: &str) -> Result<Oid> {
        let branch_ref = self
            .repo
            .find_branch(branch, git2::BranchType::Local)
            .map_err(|e| {
                FlowError::version_unavailable(format!("cannot find branch '{}': {}", branch, e))
            })?;
        let commit = branch_ref.into_reference().peel_to_commit()?;
        Ok(commit.id())
    }

    /// Highest version tag whose commit is `head` or one of its ancestors
    fn latest_version_tag(&self, head: Oid) -> Result<Option<(Version, Oid)>> {
        let mut best: Option<(Version, Oid)> = None;

        for name in self.repo.tag_names(None)?.iter().flatten() {
            let Some(version) = self.pattern.extract_version(name) else {
                continue;
            };
            let Ok(reference) = self.repo.find_reference(&format!("refs/tags/{}", name)) else {
                continue;
            };
            let Ok(commit) = reference.peel_to_commit() else {
                continue;
            };

            let oid = commit.id();
            let reachable = oid == head || self.repo.graph_descendant_of(head, oid)?;
            if reachable && best.map_or(true, |(current, _)| version > current) {
                best = Some((version, oid));
            }
        }

        Ok(best)
    }

    /// Messages of commits reachable from `head` but not from `since`
    fn messages_since(&self, head: Oid, since: Oid) -> Result<Vec<String>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(head)?;
        revwalk.hide(since)?;

        let mut messages = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            messages.push(commit.message().unwrap_or_default().to_string());
        }
        Ok(messages)
    }
}

impl VersionCalculator for GitVersionCalculator {
    fn compute_version(&self, branch: &str) -> Result<Version> {
        let head = self.branch_head(branch)?;

        let Some((tagged, tag_oid)) = self.latest_version_tag(head)? else {
            return self.initial_version.ok_or_else(|| {
                FlowError::version_unavailable(format!(
                    "no tag matching '{}' is reachable from '{}'",
                    self.pattern.as_str(),
                    branch
                ))
            });
        };

        let messages = self.messages_since(head, tag_oid)?;
        let version = match self.analyzer.analyze_messages(&messages) {
            Some(bump) => tagged.bump(&bump),
            None => tagged,
        };
        debug!(
            "{}: tag {} + {} commit(s) -> {}",
            branch,
            tagged,
            messages.len(),
            version
        );
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Commit, Signature};
    use tempfile::TempDir;

    fn analyzer() -> CommitAnalyzer {
        CommitAnalyzer::new(ConventionalCommitsConfig::default())
    }

    fn messages(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_analyze_major() {
        let bump = analyzer().analyze_messages(&messages(&[
            "feat: new feature",
            "fix(api)!: breaking change",
        ]));
        assert_eq!(bump, Some(VersionBump::Major));
    }

    #[test]
    fn test_analyze_minor() {
        let bump = analyzer().analyze_messages(&messages(&["feat: new feature", "fix: bug fix"]));
        assert_eq!(bump, Some(VersionBump::Minor));
    }

    #[test]
    fn test_analyze_patch() {
        let bump = analyzer().analyze_messages(&messages(&[
            "fix: bug fix",
            "refactor: code cleanup",
            "Merge branch 'hotfix/1.0.1'",
        ]));
        assert_eq!(bump, Some(VersionBump::Patch));
    }

    #[test]
    fn test_analyze_minor_keyword_and_footer() {
        let bump = analyzer().analyze_messages(&messages(&["chore: enhancement of logging"]));
        assert_eq!(bump, Some(VersionBump::Minor));

        let bump = analyzer()
            .analyze_messages(&messages(&["fix: drop v1 api\n\nBREAKING CHANGE: removed"]));
        assert_eq!(bump, Some(VersionBump::Major));
    }

    #[test]
    fn test_analyze_empty() {
        assert_eq!(analyzer().analyze_messages(&[]), None);
    }

    fn init_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn commit_on(repo: &Repository, branch: &str, message: &str, extra_parent: Option<Oid>) -> Oid {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let refname = format!("refs/heads/{}", branch);

        let mut parents: Vec<Commit> = Vec::new();
        if let Ok(reference) = repo.find_reference(&refname) {
            parents.push(reference.peel_to_commit().unwrap());
        }
        if let Some(oid) = extra_parent {
            parents.push(repo.find_commit(oid).unwrap());
        }
        let parent_refs: Vec<&Commit> = parents.iter().collect();

        repo.commit(Some(&refname), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn tag(repo: &Repository, name: &str, oid: Oid) {
        let object = repo.find_object(oid, None).unwrap();
        repo.tag_lightweight(name, &object, false).unwrap();
    }

    fn branch(repo: &Repository, name: &str, oid: Oid) {
        let commit = repo.find_commit(oid).unwrap();
        repo.branch(name, &commit, false).unwrap();
    }

    fn calculator(repo: Repository) -> GitVersionCalculator {
        GitVersionCalculator::from_git2(
            repo,
            TagPattern::default(),
            ConventionalCommitsConfig::default(),
        )
    }

    #[test]
    fn test_branch_on_tag_reports_tag_version() {
        let (_dir, repo) = init_repo();
        let root = commit_on(&repo, "main", "chore: init", None);
        tag(&repo, "1.4.2", root);

        let calc = calculator(repo);
        assert_eq!(calc.compute_version("main").unwrap(), Version::new(1, 4, 2));
    }

    #[test]
    fn test_commits_since_tag_are_analyzed() {
        let (_dir, repo) = init_repo();
        let root = commit_on(&repo, "main", "chore: init", None);
        tag(&repo, "1.0.0", root);
        branch(&repo, "develop", root);
        commit_on(&repo, "develop", "feat: add login", None);
        commit_on(&repo, "main", "fix: crash on start", None);

        let calc = calculator(repo);
        assert_eq!(calc.compute_version("develop").unwrap(), Version::new(1, 1, 0));
        assert_eq!(calc.compute_version("main").unwrap(), Version::new(1, 0, 1));
    }

    #[test]
    fn test_tag_reachable_through_merge() {
        let (_dir, repo) = init_repo();
        let root = commit_on(&repo, "main", "chore: init", None);
        branch(&repo, "develop", root);
        let release = commit_on(&repo, "main", "Merge branch 'release/2.0.0'", None);
        tag(&repo, "2.0.0", release);
        commit_on(&repo, "develop", "Merge branch 'main' into develop", Some(release));

        let calc = calculator(repo);
        // The merge commit itself is counted after the tag
        assert_eq!(calc.compute_version("develop").unwrap(), Version::new(2, 0, 1));
    }

    #[test]
    fn test_highest_matching_tag_wins() {
        let (_dir, repo) = init_repo();
        let first = commit_on(&repo, "main", "chore: init", None);
        tag(&repo, "1.9.0", first);
        let second = commit_on(&repo, "main", "fix: x", None);
        tag(&repo, "1.10.0", second);
        tag(&repo, "nightly", second);
        tag(&repo, "v9.0.0", second);

        let calc = calculator(repo);
        assert_eq!(calc.compute_version("main").unwrap(), Version::new(1, 10, 0));
    }

    #[test]
    fn test_no_tag_is_unavailable_without_initial_version() {
        let (_dir, repo) = init_repo();
        commit_on(&repo, "main", "chore: init", None);

        let calc = calculator(repo);
        assert!(matches!(
            calc.compute_version("main"),
            Err(FlowError::VersionUnavailable(_))
        ));
        assert!(matches!(
            calc.compute_version("develop"),
            Err(FlowError::VersionUnavailable(_))
        ));

        let calc = calc.with_initial_version(Some(Version::new(0, 1, 0)));
        assert_eq!(calc.compute_version("main").unwrap(), Version::new(0, 1, 0));
    }
}
