use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

use git_flow::analyzer::{GitVersionCalculator, VersionCalculator};
use git_flow::config::{self, Config};
use git_flow::domain::RequestedMethod;
use git_flow::git::{Backend, GitCli};
use git_flow::ui::{self, AutoConfirm, ConfirmGate, TerminalGate};
use git_flow::workflow::WorkflowController;

#[derive(Parser)]
#[command(
    name = "git-flow",
    version,
    about = "Feature, release and hotfix branch workflow on top of git"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(short, long, global = true, help = "Push without asking for confirmation")]
    yes: bool,

    #[arg(long, global = true, help = "Print git commands instead of running them")]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a feature, hotfix or release branch
    Start {
        #[command(subcommand)]
        kind: StartKind,
    },
    /// Merge a finished branch back, tag it and push
    Complete {
        #[command(subcommand)]
        kind: CompleteKind,
    },
    /// Bring the parent branch (or <branch>) into the current one
    #[command(group(ArgGroup::new("method").required(true).args(["rebase", "merge"])))]
    Update {
        branch: Option<String>,
        #[arg(long)]
        rebase: bool,
        #[arg(long)]
        merge: bool,
        #[arg(long, help = "Always create a merge commit")]
        no_ff: bool,
    },
    /// Tag HEAD with a version
    Tag {
        version: String,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long, help = "Replace an existing tag")]
        force: bool,
    },
    /// Stage resolved conflicts and continue the rebase
    ResumeRebase,
    /// Delete a local branch
    Delete {
        #[command(subcommand)]
        target: DeleteTarget,
    },
    /// Check out a branch
    Switch { branch: String },
}

#[derive(Subcommand)]
enum StartKind {
    Feature {
        name: String,
    },
    Hotfix,
    Release {
        #[arg(long, help = "Start a new major version")]
        major: bool,
        #[arg(long, help = "Use a YYYYMM.DD.0 version")]
        date: bool,
    },
}

#[derive(Subcommand)]
enum CompleteKind {
    Feature { name: Option<String> },
    Hotfix { name: Option<String> },
    Release { name: Option<String> },
}

#[derive(Subcommand)]
enum DeleteTarget {
    Branch {
        name: String,
        #[arg(short, long, help = "Delete even if not fully merged")]
        force: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let config = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let backend = GitCli::new(config.remote.clone()).with_dry_run(args.dry_run);
    let calculator = match open_calculator(&config) {
        Ok(calc) => calc,
        Err(e) => {
            ui::display_error(&format!("Git repository error: {}", e));
            std::process::exit(1);
        }
    };

    let during_rebase = matches!(
        args.command,
        Command::Update { rebase: true, .. } | Command::ResumeRebase
    );
    let outcome = if args.yes || config.behavior.assume_yes {
        run(args.command, &config, &backend, &calculator, &AutoConfirm)
    } else {
        run(args.command, &config, &backend, &calculator, &TerminalGate::new())
    };

    if let Err(e) = outcome {
        ui::display_error(&e.to_string());
        if e.is_conflict() {
            ui::display_conflict_help(during_rebase);
        }
        std::process::exit(1);
    }

    Ok(())
}

fn open_calculator(config: &Config) -> git_flow::Result<GitVersionCalculator> {
    Ok(GitVersionCalculator::open(
        ".",
        config.tag_pattern()?,
        config.conventional_commits.clone(),
    )?
    .with_initial_version(config.initial_version()?))
}

fn run<B: Backend, V: VersionCalculator, G: ConfirmGate>(
    command: Command,
    config: &Config,
    backend: &B,
    calculator: &V,
    gate: &G,
) -> git_flow::Result<()> {
    let flow = WorkflowController::new(backend, calculator, gate, config.naming())
        .with_tag_pattern(config.tag_pattern()?)
        .with_remote(config.remote.clone());

    match command {
        Command::Start { kind } => {
            let branch = match kind {
                StartKind::Feature { name } => flow.start_feature(&name)?,
                StartKind::Hotfix => flow.start_hotfix()?,
                StartKind::Release { major, date } => flow.start_release(major, date)?,
            };
            ui::display_branch_created(&branch, &flow.naming().render(&branch));
        }
        Command::Complete { kind } => {
            let completion = match kind {
                CompleteKind::Feature { name } => flow.complete_feature(name.as_deref())?,
                CompleteKind::Hotfix { name } => flow.complete_hotfix(name.as_deref())?,
                CompleteKind::Release { name } => flow.complete_release(name.as_deref())?,
            };
            let rendered = flow.naming().render(&completion.branch);
            ui::display_completion(&rendered, &completion);
        }
        Command::Update {
            branch,
            rebase,
            merge: _,
            no_ff,
        } => {
            let requested = if rebase {
                RequestedMethod::Rebase
            } else {
                RequestedMethod::Merge
            };
            let update = flow.reconcile(branch.as_deref(), requested, no_ff)?;
            for warning in &update.warnings {
                ui::display_warning(warning);
            }
            ui::display_success(&format!("Updated from {} ({})", update.source, update.method));
        }
        Command::Tag {
            version,
            message,
            force,
        } => {
            let tag = flow.tag(&version, message.as_deref(), force)?;
            ui::display_success(&format!("Created tag {}", tag));
        }
        Command::ResumeRebase => {
            flow.resume_rebase()?;
            ui::display_success("Rebase continued");
        }
        Command::Delete {
            target: DeleteTarget::Branch { name, force },
        } => {
            flow.delete_branch(&name, force)?;
            ui::display_success(&format!("Deleted branch {}", name));
        }
        Command::Switch { branch } => {
            flow.switch_to(&branch)?;
            ui::display_success(&format!("Switched to {}", branch));
        }
    }

    Ok(())
}
