use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wpe")]
#[command(version)]
#[command(about = "Declarative reconciler for WP Engine resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ./wpe.toml, then ~/.config/wpe/wpe.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// WP Engine API token
    #[arg(long, global = true, env = "WPENGINE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Make remote resources match the config
    Apply(ApplyArgs),

    /// Re-read tracked resources into the state file
    Refresh(TargetArgs),

    /// Delete tracked remote resources
    Destroy(DestroyArgs),

    /// Inspect the state file
    #[command(subcommand)]
    State(StateCommand),

    /// List resource kinds, or describe one
    Kinds {
        /// Kind to describe
        name: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct TargetArgs {
    /// Only resources matching KIND or KIND.NAME
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Plan against the stored snapshots without reading the API
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Show the plan and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Delete and re-create resources whose immutable attributes changed
    #[arg(long)]
    pub replace: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Args)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of parallel jobs
    #[arg(short, long, default_value = "4")]
    pub jobs: u16,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// List tracked resources
    List,

    /// Show the stored snapshot of one resource
    Show {
        /// Resource address (KIND.NAME)
        address: String,
    },

    /// Stop tracking a resource without deleting it remotely
    Rm {
        /// Resource address (KIND.NAME)
        address: String,
    },
}
