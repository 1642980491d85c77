//! Devtrack CLI - Development progress tracking for multi-component projects.

use chrono::Local;
use clap::Parser;
use devtrack::cli::{Cli, Commands, MilestoneCommands};
use devtrack::commands::{self, LogRequest, MembershipChange, MilestoneEdit, Output, Workspace};
use devtrack::prompt::{AutoPrompter, Prompter, StdinPrompter};
use devtrack::storage::find_git_root;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic log filter.
const LOG_ENV: &str = "DEVTRACK_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();
    let human = cli.human_readable;

    // Determine repo path: --repo flag > DEVTRACK_REPO env > auto-detect git root > cwd
    let repo_path = resolve_repo_path(cli.repo_path, human);

    if let Err(e) = run_command(cli.command, &repo_path, human) {
        tracing::debug!(error = %e, "command failed");
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

/// Install a compact stderr subscriber filtered by `DEVTRACK_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Resolve the repository path based on explicit flag, environment variable, or auto-detection.
///
/// When an explicit path is provided (via -C/--repo or DEVTRACK_REPO), it is used
/// literally without git root detection.
fn resolve_repo_path(explicit_path: Option<PathBuf>, human: bool) -> PathBuf {
    match explicit_path {
        Some(path) => {
            if !path.exists() {
                let message = format!("Specified repo path does not exist: {}", path.display());
                if human {
                    eprintln!("Error: {}", message);
                } else {
                    eprintln!("{}", serde_json::json!({ "error": message }));
                }
                process::exit(1);
            }
            path
        }
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_git_root(&cwd).unwrap_or(cwd)
        }
    }
}

/// Pick the prompter for a command from its `--yes` / `--no-input` flags.
fn prompter(yes: bool, no_input: bool) -> Box<dyn Prompter> {
    if yes {
        Box::new(AutoPrompter(true))
    } else if no_input {
        Box::new(AutoPrompter(false))
    } else {
        Box::new(StdinPrompter::stdin())
    }
}

fn run_command(command: Commands, repo_path: &Path, human: bool) -> devtrack::Result<()> {
    let mut ws = Workspace::open(repo_path)?;

    match command {
        Commands::Init { write_config } => {
            let result = commands::init(&ws, write_config)?;
            output(&result, human);
        }
        Commands::Status { component } => {
            let result = commands::status(&ws, component.as_deref())?;
            output(&result, human);
        }
        Commands::Log {
            component,
            status,
            phase,
            progress,
            note,
            issue,
            resolve,
            yes,
            no_input,
        } => {
            let request = if let Some(status) = status {
                LogRequest::Status(status.parse()?)
            } else if let Some(phase) = phase {
                LogRequest::Phase(phase.parse()?)
            } else if let Some(progress) = progress {
                LogRequest::Progress(progress)
            } else if let Some(note) = note {
                LogRequest::Note(note)
            } else if let Some(issue) = issue {
                LogRequest::Issue(issue)
            } else if let Some(index) = resolve {
                LogRequest::Resolve(index)
            } else {
                return Err(devtrack::Error::InvalidInput(
                    "no update given".to_string(),
                ));
            };
            let mut prompter = prompter(yes, no_input);
            let result = commands::log_component(&mut ws, &component, request, prompter.as_mut())?;
            output(&result, human);
        }
        Commands::Dependencies { component, dot } => {
            let result = commands::dependencies(&ws, component.as_deref(), dot)?;
            output(&result, human);
        }
        Commands::Milestone { command } => run_milestone(command, &mut ws, human)?,
        Commands::Plan => {
            let result = commands::plan(&ws, Local::now().date_naive())?;
            output(&result, human);
        }
        Commands::Diagnose { recent } => {
            let result = commands::diagnose(&ws, recent)?;
            output(&result, human);
        }
        Commands::Activity { component, limit } => {
            let result = commands::activity(&ws, limit, component.as_deref())?;
            output(&result, human);
        }
    }
    Ok(())
}

fn run_milestone(command: MilestoneCommands, ws: &mut Workspace, human: bool) -> devtrack::Result<()> {
    match command {
        MilestoneCommands::List => {
            let result = commands::milestone_list(ws)?;
            output(&result, human);
        }
        MilestoneCommands::Show { name } => {
            let result = commands::milestone_show(ws, &name)?;
            output(&result, human);
        }
        MilestoneCommands::Add {
            name,
            target_date,
            description,
            components,
        } => {
            let result =
                commands::milestone_add(ws, &name, target_date.as_deref(), description, components)?;
            output(&result, human);
        }
        MilestoneCommands::Update {
            name,
            status,
            target_date,
            description,
        } => {
            let edit = MilestoneEdit {
                status: status.map(|s| s.parse()).transpose()?,
                target_date,
                description,
            };
            let result = commands::milestone_update(ws, &name, edit)?;
            output(&result, human);
        }
        MilestoneCommands::Components {
            name,
            add,
            remove,
            set,
        } => {
            let change = if !add.is_empty() {
                MembershipChange::Add(add)
            } else if !remove.is_empty() {
                MembershipChange::Remove(remove)
            } else {
                MembershipChange::Replace(set)
            };
            let result = commands::milestone_components(ws, &name, change)?;
            output(&result, human);
        }
        MilestoneCommands::Note { name, text } => {
            let result = commands::milestone_note(ws, &name, &text)?;
            output(&result, human);
        }
        MilestoneCommands::Complete {
            name,
            yes,
            no_input,
        } => {
            let mut prompter = prompter(yes, no_input);
            let result = commands::milestone_complete(ws, &name, prompter.as_mut())?;
            output(&result, human);
        }
    }
    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
