//! Pure formatting functions for UI output.
//!
//! Issued git commands, progress, results, warnings and errors each get a
//! distinct marker so an operator can tell them apart at a glance.

use console::style;

use crate::domain::{BranchRef, Version};
use crate::warning::FlowWarning;
use crate::workflow::{Completion, CompletionPlan};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Echo a git command about to be issued.
pub fn display_command(command: &str) {
    println!("  {}", style(format!("$ {}", command)).cyan());
}

/// Display a non-fatal warning.
pub fn display_warning(warning: &FlowWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Announce the version a new release or hotfix branch is based on.
pub fn display_version_decision(current: &Version, next: &Version, branch: &str) {
    println!(
        "\n{}  {} → {}  ({})",
        style("Version:").bold(),
        style(current).red(),
        style(next).green(),
        branch
    );
}

/// List the steps of a plan before it runs.
pub fn display_plan(title: &str, plan: &CompletionPlan) {
    println!("\n{}", style(title).bold());
    for (i, step) in plan.steps().iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

/// Summarize a finished completion.
pub fn display_completion(branch: &str, completion: &Completion) {
    for warning in &completion.warnings {
        display_warning(warning);
    }
    let tag = completion
        .tag
        .as_deref()
        .map(|t| format!(" as {}", style(t).green()))
        .unwrap_or_default();
    display_success(&format!("Completed {}{}", branch, tag));
}

/// Display manual push instruction after the operator declined the push.
pub fn display_manual_push_instruction(remote: &str, refs: &str, include_tags: bool) {
    let tags = if include_tags {
        format!(" && git push {} --tags", remote)
    } else {
        String::new()
    };
    println!(
        "\n{} To push later, run:\n  {}",
        style("→").yellow(),
        style(format!("git push {} {}{}", remote, refs, tags)).cyan()
    );
}

/// Explain how to get out of a conflicted merge or rebase.
pub fn display_conflict_help(during_rebase: bool) {
    if during_rebase {
        println!(
            "\n{} Resolve the conflicts, then run {}",
            style("→").yellow(),
            style("git-flow resume-rebase").cyan()
        );
    } else {
        println!(
            "\n{} Resolve the conflicts and commit the merge, then re-run the same command",
            style("→").yellow()
        );
    }
}

/// Name of a freshly created branch.
pub fn display_branch_created(branch: &BranchRef, rendered: &str) {
    display_success(&format!(
        "Created {} branch {}",
        branch.role,
        style(rendered).green().bold()
    ));
}
