mod address;
mod cli;
mod commands;
mod config;
mod retry;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Explicit config file from `--config`
    pub config: Option<PathBuf>,
    pub token: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        config: cli.config,
        token: cli.token,
    };

    match cli.command {
        Command::Plan(args) => {
            commands::plan::run(&ctx, args.target.target.as_deref(), args.no_refresh)
        }
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Refresh(args) => commands::refresh::run(&ctx, args.target.as_deref()),
        Command::Destroy(args) => commands::destroy::run(&ctx, &args),
        Command::State(cmd) => commands::state::run(&ctx, &cmd),
        Command::Kinds { name } => commands::kinds::run(name.as_deref()),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "wpe", &mut io::stdout());
            Ok(())
        }
    }
}
