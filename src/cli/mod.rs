//! CLI argument definitions for Devtrack.

use clap::{ArgGroup, Parser, Subcommand};

/// Devtrack - Track development progress across the components of a project.
///
/// Start with `devtrack status` for an overview, then `devtrack plan` to see
/// what to work on next.
#[derive(Parser, Debug)]
#[command(name = "devtrack")]
#[command(author, version, about = "Track component progress, dependencies and milestones", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if devtrack was started in <path> instead of the current directory.
    /// The path must exist. Bypasses git root detection - uses the path literally.
    /// Can also be set via DEVTRACK_REPO environment variable.
    #[arg(short = 'C', long = "repo", global = true, env = "DEVTRACK_REPO")]
    pub repo_path: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create component and milestone records from configuration
    ///
    /// Safe to run repeatedly: existing records are kept and only newly
    /// configured components or milestones are added.
    Init {
        /// Also write the active configuration to devtrack.kdl in the repository
        #[arg(long)]
        write_config: bool,
    },

    /// Show the project summary, or the full record of one component
    Status {
        /// Component name
        component: Option<String>,
    },

    /// Record an update to a component (exactly one of the update flags)
    #[command(group(
        ArgGroup::new("update")
            .required(true)
            .multiple(false)
            .args(["status", "phase", "progress", "note", "issue", "resolve"])
    ))]
    Log {
        /// Component name
        component: String,

        /// New status (not-started, in-progress, blocked, review, completed)
        #[arg(long)]
        status: Option<String>,

        /// New phase (planning, development, testing, deployment, maintenance)
        #[arg(long)]
        phase: Option<String>,

        /// Completion percentage (0-100; out-of-range values are clamped)
        #[arg(long, allow_hyphen_values = true)]
        progress: Option<String>,

        /// Add a note
        #[arg(long)]
        note: Option<String>,

        /// Report an issue
        #[arg(long)]
        issue: Option<String>,

        /// Resolve the issue at this index
        #[arg(long)]
        resolve: Option<usize>,

        /// Answer yes to any confirmation
        #[arg(short = 'y', long, conflicts_with = "no_input")]
        yes: bool,

        /// Never prompt; decline any confirmation
        #[arg(long)]
        no_input: bool,
    },

    /// Show dependency analysis and readiness
    Dependencies {
        /// Limit the analysis to one component
        component: Option<String>,

        /// Also write the graph as Graphviz DOT to the data directory
        #[arg(long)]
        dot: bool,
    },

    /// Milestone management commands
    Milestone {
        #[command(subcommand)]
        command: MilestoneCommands,
    },

    /// Show the critical path and recommended next steps
    Plan,

    /// Generate a diagnostic report and save it to the data directory
    Diagnose {
        /// Number of recent activity entries to include (default from configuration)
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Show recent activity, newest first
    Activity {
        /// Only show entries for this component or milestone
        component: Option<String>,

        /// Maximum number of entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}

/// Milestone subcommands
#[derive(Subcommand, Debug)]
pub enum MilestoneCommands {
    /// List milestones with progress
    List,

    /// Show milestone details with member progress
    Show {
        /// Milestone name
        name: String,
    },

    /// Create a new milestone
    Add {
        /// Milestone name
        name: String,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        target_date: Option<String>,

        /// Milestone description
        #[arg(short, long)]
        description: Option<String>,

        /// Member components (repeatable)
        #[arg(short, long = "component")]
        components: Vec<String>,
    },

    /// Update milestone status, target date or description
    Update {
        /// Milestone name
        name: String,

        /// New status (not-started, in-progress, delayed, completed, cancelled)
        #[arg(long)]
        status: Option<String>,

        /// New target date (YYYY-MM-DD); an empty value clears it
        #[arg(long)]
        target_date: Option<String>,

        /// New description; an empty value clears it
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Change milestone membership (exactly one of --add, --remove, --set)
    #[command(group(
        ArgGroup::new("change")
            .required(true)
            .multiple(false)
            .args(["add", "remove", "set"])
    ))]
    Components {
        /// Milestone name
        name: String,

        /// Components to add
        #[arg(long, num_args = 1..)]
        add: Vec<String>,

        /// Components to remove
        #[arg(long, num_args = 1..)]
        remove: Vec<String>,

        /// Replace membership with exactly these components
        #[arg(long, num_args = 1..)]
        set: Vec<String>,
    },

    /// Add a note to a milestone
    Note {
        /// Milestone name
        name: String,

        /// Note text
        text: String,
    },

    /// Mark a milestone Completed
    Complete {
        /// Milestone name
        name: String,

        /// Complete even if member components are unfinished
        #[arg(short = 'y', long, conflicts_with = "no_input")]
        yes: bool,

        /// Never prompt; leave unfinished milestones open
        #[arg(long)]
        no_input: bool,
    },
}
