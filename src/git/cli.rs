use std::path::PathBuf;
use std::process::Command;

use log::debug;

use crate::domain::ReconcileMethod;
use crate::error::{FlowError, Result};
use crate::git::{Backend, PushTarget};
use crate::ui;

/// Captured result of one git invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    fn dry_run() -> Self {
        GitOutput {
            success: true,
            ..GitOutput::default()
        }
    }

    /// stdout and stderr together; git splits conflict reports across both
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, _) => stderr.to_string(),
            (_, true) => stdout.to_string(),
            _ => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Backend driving the `git` executable.
///
/// Mutating commands are echoed before they run. In dry-run mode they are
/// echoed and reported as successful without running; read-only queries
/// (current branch, branch existence, upstream lookup) always run.
pub struct GitCli {
    remote: String,
    workdir: Option<PathBuf>,
    dry_run: bool,
}

impl GitCli {
    pub fn new(remote: impl Into<String>) -> Self {
        GitCli {
            remote: remote.into(),
            workdir: None,
            dry_run: false,
        }
    }

    /// Run git inside `path` instead of the process working directory
    pub fn in_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = Some(path.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    fn invoke(&self, args: &[String]) -> Result<GitOutput> {
        let mut command = Command::new("git");
        command.args(args);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        let output = command.output()?;
        let result = GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(
            "git {} -> success={} stderr={}",
            args.join(" "),
            result.success,
            result.stderr.trim()
        );
        Ok(result)
    }

    /// Read-only query: not echoed, runs in dry-run mode too
    fn query(&self, args: &[&str]) -> Result<GitOutput> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        self.invoke(&args)
    }

    /// Mutating command: echoed, skipped in dry-run mode
    fn run(&self, args: Vec<String>) -> Result<GitOutput> {
        let line = format!("git {}", args.join(" "));
        if self.dry_run {
            ui::display_command(&format!("{}  (dry run)", line));
            return Ok(GitOutput::dry_run());
        }
        ui::display_command(&line);
        self.invoke(&args)
    }

    fn has_upstream(&self) -> Result<bool> {
        let output = self.query(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?;
        Ok(output.success)
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Subject prefix git writes for a merge of `source`
pub fn merge_message_pattern(source: &str) -> String {
    format!("Merge branch '{}'", source)
}

/// Arguments for reconciling `source` into the checked-out branch
pub fn reconcile_args(method: ReconcileMethod, source: &str) -> Vec<String> {
    match method {
        ReconcileMethod::Rebase => owned(&["rebase", source]),
        ReconcileMethod::Merge => owned(&["merge", "--no-edit", source]),
        ReconcileMethod::MergeNoFastForward => owned(&["merge", "--no-ff", "--no-edit", source]),
    }
}

/// Arguments for the branch push; tags are pushed by a separate command
pub fn push_args(remote: &str, target: &PushTarget, force: bool) -> Vec<String> {
    let mut args = owned(&["push"]);
    if force {
        args.push("--force".to_string());
    }
    args.push(remote.to_string());
    match target {
        PushTarget::All => args.push("--all".to_string()),
        PushTarget::Branches(branches) => args.extend(branches.iter().cloned()),
    }
    args
}

fn is_network_failure(text: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "Could not read from remote",
        "unable to access",
        "Could not resolve host",
        "Connection refused",
        "does not appear to be a git repository",
    ];
    MARKERS.iter().any(|marker| text.contains(marker))
}

fn is_conflict(text: &str) -> bool {
    text.contains("CONFLICT") || text.contains("could not apply") || text.contains("needs merge")
}

/// Map a failed reconcile (merge, rebase or rebase continuation) onto an error
pub fn classify_reconcile_failure(source: &str, output: &GitOutput) -> FlowError {
    let text = output.combined();
    if is_conflict(&text) {
        FlowError::Conflict {
            branch: source.to_string(),
            details: text,
        }
    } else if text.contains("not something we can merge") || text.contains("invalid upstream") {
        FlowError::BranchNotFound(source.to_string())
    } else {
        FlowError::backend(text)
    }
}

/// Map a failed branch deletion onto an error
pub fn classify_delete_failure(name: &str, output: &GitOutput) -> FlowError {
    let text = output.combined();
    if text.contains("not fully merged") {
        FlowError::NotFullyMerged(name.to_string())
    } else if text.contains("not found") {
        FlowError::BranchNotFound(name.to_string())
    } else {
        FlowError::backend(text)
    }
}

/// Map a failed fetch onto an error
///
/// A branch missing on the remote is reported as `BranchNotFound`; only
/// transport failures count as `Network`.
pub fn classify_fetch_failure(name: &str, output: &GitOutput) -> FlowError {
    let text = output.combined();
    if text.contains("couldn't find remote ref") {
        FlowError::BranchNotFound(name.to_string())
    } else if is_network_failure(&text) {
        FlowError::Network(text)
    } else if text.contains("[rejected]") || text.contains("non-fast-forward") {
        FlowError::Rejected(text)
    } else {
        FlowError::backend(text)
    }
}

/// Parse `rev-list --left-right --count` output into (ahead, behind)
pub fn parse_ahead_behind(text: &str) -> Option<(u32, u32)> {
    let mut counts = text.split_whitespace().map(|n| n.parse::<u32>());
    match (counts.next(), counts.next(), counts.next()) {
        (Some(Ok(ahead)), Some(Ok(behind)), None) => Some((ahead, behind)),
        _ => None,
    }
}

/// Map a failed push onto an error
pub fn classify_push_failure(output: &GitOutput) -> FlowError {
    let text = output.combined();
    if is_network_failure(&text) {
        FlowError::Network(text)
    } else {
        FlowError::Rejected(text)
    }
}

impl Backend for GitCli {
    fn current_branch(&self) -> Result<String> {
        let output = self.query(&["rev-parse", "--abbrev-ref", "HEAD"])?;
        if !output.success {
            return Err(FlowError::backend(output.combined()));
        }
        let name = output.stdout.trim().to_string();
        if name == "HEAD" {
            return Err(FlowError::backend("HEAD is detached; check out a branch first"));
        }
        Ok(name)
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", name);
        let output = self.query(&["rev-parse", "--verify", "--quiet", reference.as_str()])?;
        Ok(output.success)
    }

    fn has_merged(&self, source: &str, into: &str) -> Result<bool> {
        let pattern = merge_message_pattern(source);
        let output = self.query(&[
            "log",
            "--merges",
            "--fixed-strings",
            "--format=%H",
            "--grep",
            pattern.as_str(),
            into,
        ])?;
        Ok(output.success && !output.stdout.trim().is_empty())
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        let output = self.run(owned(&["checkout", name]))?;
        if !output.success {
            let text = output.combined();
            return Err(
                if text.contains("did not match any") || text.contains("invalid reference") {
                    FlowError::BranchNotFound(name.to_string())
                } else {
                    FlowError::backend(text)
                },
            );
        }

        if !self.dry_run && !self.has_upstream()? {
            debug!("'{}' has no upstream; skipping fast-forward", name);
            return Ok(());
        }

        let output = self.run(owned(&["pull", "--ff-only"]))?;
        if !output.success {
            let text = output.combined();
            return Err(if is_network_failure(&text) {
                FlowError::Network(text)
            } else {
                FlowError::backend(text)
            });
        }
        Ok(())
    }

    fn fetch_branch(&self, name: &str) -> Result<()> {
        let output = self.run(owned(&["fetch", self.remote.as_str(), name]))?;
        if !output.success {
            return match classify_fetch_failure(name, &output) {
                FlowError::BranchNotFound(_) => {
                    debug!("'{}' is not on {}; using the local branch", name, self.remote);
                    Ok(())
                }
                e => Err(e),
            };
        }
        if self.dry_run {
            return Ok(());
        }

        let tracking = format!("{}/{}", self.remote, name);
        let local = format!("refs/heads/{}", name);
        if !self.query(&["rev-parse", "--verify", "--quiet", local.as_str()])?.success {
            let output = self.run(owned(&["branch", "--track", name, tracking.as_str()]))?;
            if !output.success {
                return Err(FlowError::backend(output.combined()));
            }
            return Ok(());
        }

        let range = format!("{}...{}", local, tracking);
        let counts = self.query(&["rev-list", "--left-right", "--count", range.as_str()])?;
        if !counts.success {
            return Err(FlowError::backend(counts.combined()));
        }
        match parse_ahead_behind(&counts.stdout) {
            Some((0, behind)) if behind > 0 => {
                let output = self.run(owned(&["branch", "-f", name, tracking.as_str()]))?;
                if !output.success {
                    return Err(FlowError::backend(output.combined()));
                }
            }
            Some((ahead, behind)) => debug!(
                "'{}' is {} ahead and {} behind {}; keeping the local branch",
                name, ahead, behind, tracking
            ),
            None => return Err(FlowError::backend(counts.combined())),
        }
        Ok(())
    }

    fn reconcile(&self, method: ReconcileMethod, source: &str) -> Result<()> {
        let output = self.run(reconcile_args(method, source))?;
        if !output.success {
            return Err(classify_reconcile_failure(source, &output));
        }
        Ok(())
    }

    fn create_branch(&self, name: &str, from: &str) -> Result<()> {
        let output = self.run(owned(&["branch", name, from]))?;
        if !output.success {
            let text = output.combined();
            return Err(if text.contains("already exists") {
                FlowError::BranchExists(name.to_string())
            } else if text.contains("not a valid") {
                FlowError::BranchNotFound(from.to_string())
            } else {
                FlowError::backend(text)
            });
        }
        Ok(())
    }

    fn delete_branch(&self, name: &str, force: bool) -> Result<()> {
        let flag = if force { "-D" } else { "-d" };
        let output = self.run(owned(&["branch", flag, name]))?;
        if !output.success {
            return Err(classify_delete_failure(name, &output));
        }
        Ok(())
    }

    fn tag(&self, name: &str, message: &str, target: Option<&str>, force: bool) -> Result<()> {
        let mut args = owned(&["tag", "-a"]);
        if force {
            args.push("-f".to_string());
        }
        args.extend(owned(&[name, "-m", message]));
        if let Some(target) = target {
            args.push(target.to_string());
        }

        let output = self.run(args)?;
        if !output.success {
            return Err(FlowError::backend(output.combined()));
        }
        Ok(())
    }

    fn push(&self, target: &PushTarget, include_tags: bool, force: bool) -> Result<()> {
        let output = self.run(push_args(&self.remote, target, force))?;
        if !output.success {
            return Err(classify_push_failure(&output));
        }

        if include_tags {
            let mut args = owned(&["push"]);
            if force {
                args.push("--force".to_string());
            }
            args.extend(owned(&[self.remote.as_str(), "--tags"]));
            let output = self.run(args)?;
            if !output.success {
                return Err(classify_push_failure(&output));
            }
        }
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let output = self.run(owned(&["add", "-A"]))?;
        if !output.success {
            return Err(FlowError::backend(output.combined()));
        }
        Ok(())
    }

    fn continue_rebase(&self) -> Result<()> {
        let output = self.run(owned(&["-c", "core.editor=true", "rebase", "--continue"]))?;
        if !output.success {
            return Err(classify_reconcile_failure("rebase --continue", &output));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> GitOutput {
        GitOutput {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_reconcile_args() {
        assert_eq!(
            reconcile_args(ReconcileMethod::Rebase, "develop"),
            vec!["rebase", "develop"]
        );
        assert_eq!(
            reconcile_args(ReconcileMethod::Merge, "main"),
            vec!["merge", "--no-edit", "main"]
        );
        assert_eq!(
            reconcile_args(ReconcileMethod::MergeNoFastForward, "hotfix/1.4.3"),
            vec!["merge", "--no-ff", "--no-edit", "hotfix/1.4.3"]
        );
    }

    #[test]
    fn test_push_args() {
        assert_eq!(
            push_args("origin", &PushTarget::All, false),
            vec!["push", "origin", "--all"]
        );
        assert_eq!(
            push_args(
                "origin",
                &PushTarget::Branches(vec!["feature/x".to_string()]),
                true
            ),
            vec!["push", "--force", "origin", "feature/x"]
        );
    }

    #[test]
    fn test_classify_merge_conflict() {
        let output = GitOutput {
            success: false,
            stdout: "Auto-merging src/lib.rs\nCONFLICT (content): Merge conflict in src/lib.rs"
                .to_string(),
            stderr: "Automatic merge failed; fix conflicts and then commit the result."
                .to_string(),
        };
        match classify_reconcile_failure("develop", &output) {
            FlowError::Conflict { branch, details } => {
                assert_eq!(branch, "develop");
                assert!(details.contains("CONFLICT (content)"));
                assert!(details.contains("Automatic merge failed"));
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_rebase_conflict() {
        let output = failed("error: could not apply 1a2b3c4... add login");
        assert!(classify_reconcile_failure("develop", &output).is_conflict());
    }

    #[test]
    fn test_classify_unknown_merge_source() {
        let output = failed("merge: hotfix/9.9.9 - not something we can merge");
        assert!(matches!(
            classify_reconcile_failure("hotfix/9.9.9", &output),
            FlowError::BranchNotFound(_)
        ));
    }

    #[test]
    fn test_classify_delete_failures() {
        let unmerged = failed("error: The branch 'feature/x' is not fully merged.");
        assert!(matches!(
            classify_delete_failure("feature/x", &unmerged),
            FlowError::NotFullyMerged(_)
        ));

        let missing = failed("error: branch 'feature/x' not found.");
        assert!(matches!(
            classify_delete_failure("feature/x", &missing),
            FlowError::BranchNotFound(_)
        ));
    }

    #[test]
    fn test_classify_push_failures() {
        let rejected = failed(" ! [rejected]        main -> main (fetch first)");
        assert!(matches!(
            classify_push_failure(&rejected),
            FlowError::Rejected(_)
        ));

        let offline = failed("fatal: unable to access 'https://example.com/repo.git/'");
        assert!(matches!(classify_push_failure(&offline), FlowError::Network(_)));
    }

    #[test]
    fn test_classify_fetch_failures() {
        let missing = failed("fatal: couldn't find remote ref feature/local-only");
        assert!(matches!(
            classify_fetch_failure("feature/local-only", &missing),
            FlowError::BranchNotFound(_)
        ));

        let offline = failed(
            "fatal: '/tmp/gone' does not appear to be a git repository\n\
             fatal: Could not read from remote repository.",
        );
        assert!(matches!(
            classify_fetch_failure("develop", &offline),
            FlowError::Network(_)
        ));

        let rejected = failed(" ! [rejected]        develop    -> develop  (non-fast-forward)");
        assert!(matches!(
            classify_fetch_failure("develop", &rejected),
            FlowError::Rejected(_)
        ));
    }

    #[test]
    fn test_parse_ahead_behind() {
        assert_eq!(parse_ahead_behind("1\t0\n"), Some((1, 0)));
        assert_eq!(parse_ahead_behind("0\t3\n"), Some((0, 3)));
        assert_eq!(parse_ahead_behind(""), None);
        assert_eq!(parse_ahead_behind("fatal: bad revision"), None);
    }

    #[test]
    fn test_merge_message_pattern() {
        assert_eq!(
            merge_message_pattern("hotfix/1.4.3"),
            "Merge branch 'hotfix/1.4.3'"
        );
    }

    #[test]
    fn test_dry_run_reports_success_without_running() {
        let git = GitCli::new("origin")
            .in_dir("/nonexistent/git-flow-dry-run")
            .with_dry_run(true);
        assert!(git.create_branch("feature/x", "develop").is_ok());
        assert!(git.delete_branch("feature/x", true).is_ok());
        assert!(git.tag("1.0.0", "Release 1.0.0", None, true).is_ok());
        assert_eq!(git.remote(), "origin");
    }
}
