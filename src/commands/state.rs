//! `wpe state` - inspect and edit the state file

use anyhow::{Context as AnyhowContext, Result, bail};
use std::path::PathBuf;

use crate::Context;
use crate::address::Address;
use crate::cli::StateCommand;
use crate::config::Config;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, command: &StateCommand) -> Result<()> {
    let (path, mut state) = open(ctx)?;

    match command {
        StateCommand::List => list(&state),
        StateCommand::Show { address } => show(&state, &Address::parse(address)?),
        StateCommand::Rm { address } => {
            let address = Address::parse(address)?;
            let Some(entry) = state.remove(&address) else {
                bail!("{address} is not tracked");
            };
            state.save(&path)?;
            ui::success(&format!(
                "{address} ({}) is no longer tracked; the remote resource was not deleted",
                entry.remote_id
            ));
            Ok(())
        }
    }
}

/// State path and contents; the config is read only for its location.
fn open(ctx: &Context) -> Result<(PathBuf, StateFile)> {
    let config_path = Config::locate(ctx.config.as_deref())?;
    let config = Config::load(&config_path)?;
    let path = config.state_path(&config_path);
    let state = StateFile::load(&path)?;
    Ok((path, state))
}

fn list(state: &StateFile) -> Result<()> {
    if state.resources.is_empty() {
        ui::info("Nothing tracked");
        return Ok(());
    }

    ui::header(&format!("Tracked resources ({})", state.resources.len()));
    for (address, entry) in &state.resources {
        println!("  {address}");
        ui::kv("id", &entry.remote_id);
        ui::kv(
            "updated",
            &entry.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        );
        if entry.observed.is_none() {
            ui::dim("no snapshot; next plan reads it first");
        }
    }
    Ok(())
}

fn show(state: &StateFile, address: &Address) -> Result<()> {
    let entry = state
        .get(address)
        .with_context(|| format!("{address} is not tracked"))?;
    let json = serde_json::to_string_pretty(entry).context("Failed to serialize state entry")?;
    println!("{json}");
    Ok(())
}
