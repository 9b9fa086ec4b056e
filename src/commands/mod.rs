//! Command implementations
//!
//! Every command that touches the API opens a [`Session`]: config, resolved
//! resources and state, loaded once.

pub mod apply;
pub mod destroy;
pub mod kinds;
pub mod plan;
pub mod refresh;
pub mod state;

use anyhow::{Context as AnyhowContext, Result, anyhow};
use rayon::prelude::*;
use reconcile::{Outcome, ResourceInstance, ResourceKind};
use std::path::PathBuf;
use wpengine::ApiClient;

use crate::Context;
use crate::address::{Address, Target, parse_target, selected};
use crate::config::{Config, Declared};
use crate::retry::RetryConfig;
use crate::state::StateFile;

/// Parallel jobs for commands without a `--jobs` flag
pub const DEFAULT_JOBS: usize = 4;

/// Loaded config and state for one command run
pub struct Session {
    pub config: Config,
    pub declared: Vec<Declared>,
    pub state_path: PathBuf,
    pub state: StateFile,
    pub target: Option<Target>,
}

impl Session {
    pub fn open(ctx: &Context, target: Option<&str>) -> Result<Self> {
        let config_path = Config::locate(ctx.config.as_deref())?;
        let config = Config::load(&config_path)?;
        let declared = config.declared()?;
        let state_path = config.state_path(&config_path);
        let state = StateFile::load(&state_path)?;

        Ok(Self {
            config,
            declared,
            state_path,
            state,
            target: parse_target(target)?,
        })
    }

    /// Build the API client; needs a token
    pub fn client(&self, ctx: &Context) -> Result<ApiClient> {
        let token = ctx
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .context("No API token: pass --token or set WPENGINE_API_TOKEN")?;

        Ok(
            ApiClient::with_base_url(&self.config.provider.base_url, token)
                .timeout(self.config.provider.timeout()),
        )
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.config.retry
    }

    /// Declared resources selected by the target, as instances
    pub fn instances(&self) -> Vec<Work> {
        self.declared
            .iter()
            .filter(|d| selected(self.target.as_ref(), &d.address))
            .map(|d| Work {
                address: d.address.clone(),
                instance: self.state.instance(&d.address, d.kind, d.desired.clone()),
            })
            .collect()
    }

    /// Tracked resources no longer declared, selected by the target
    pub fn orphans(&self) -> Result<Vec<Work>> {
        let mut orphans = Vec::new();
        for address in self.state.addresses()? {
            if !selected(self.target.as_ref(), &address)
                || self.declared.iter().any(|d| d.address == address)
            {
                continue;
            }
            orphans.push(self.tracked(address)?);
        }
        Ok(orphans)
    }

    /// Every tracked resource selected by the target, declared or not
    pub fn tracked_all(&self) -> Result<Vec<Work>> {
        self.state
            .addresses()?
            .into_iter()
            .filter(|address| selected(self.target.as_ref(), address))
            .map(|address| self.tracked(address))
            .collect()
    }

    fn tracked(&self, address: Address) -> Result<Work> {
        let desired = self
            .declared
            .iter()
            .find(|d| d.address == address)
            .map(|d| d.desired.clone())
            .unwrap_or_default();
        let kind = stored_kind(&address)?;
        let instance = self.state.instance(&address, kind, desired);
        Ok(Work { address, instance })
    }

    /// Write back instances and save, whatever their outcomes
    pub fn save(&mut self, done: Vec<Done>) -> Result<()> {
        for item in done {
            self.state.record(&item.address, item.instance);
        }
        self.state.save(&self.state_path)
    }
}

fn stored_kind(address: &Address) -> Result<&'static ResourceKind> {
    wpengine::CATALOG
        .get(&address.kind)
        .with_context(|| format!("State tracks {address} of unknown kind '{}'", address.kind))
}

/// One resource to process
pub struct Work {
    pub address: Address,
    pub instance: ResourceInstance,
}

/// A processed resource and what happened to it
pub struct Done {
    pub address: Address,
    pub instance: ResourceInstance,
    pub result: reconcile::Result<Outcome>,
}

/// Run `op` over every item on a pool of `jobs` threads.
///
/// Results come back in input order.
pub fn execute<F>(items: Vec<Work>, jobs: usize, op: F) -> Result<Vec<Done>>
where
    F: Fn(&mut ResourceInstance) -> reconcile::Result<Outcome> + Sync,
{
    let run = |mut work: Work| {
        let result = op(&mut work.instance);
        if let Err(e) = &result {
            log::debug!("{}: {e}", work.address);
        }
        Done {
            address: work.address,
            instance: work.instance,
            result,
        }
    };

    if jobs <= 1 || items.len() <= 1 {
        return Ok(items.into_iter().map(run).collect());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| anyhow!("Failed to create thread pool: {e}"))?;

    Ok(pool.install(|| items.into_par_iter().map(run).collect()))
}

/// Ask before changing remote resources
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::{MockClient, Operation, Reconciler, attrs};
    use wpengine::kinds::SSH_KEY;

    fn work(name: &str) -> Work {
        Work {
            address: Address::new("ssh_key", name),
            instance: ResourceInstance::new(&SSH_KEY, attrs! { "public_key" => name }),
        }
    }

    #[test]
    fn test_execute_parallel_keeps_order() {
        let mock = MockClient::new();
        let reconciler = Reconciler::new(&mock);
        let items = vec![work("a"), work("b"), work("c"), work("d")];

        let done = execute(items, 3, |i| reconciler.reconcile(i)).unwrap();

        let names: Vec<_> = done.iter().map(|d| d.address.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(done.iter().all(|d| d.result.is_ok()));
        assert_eq!(mock.count(Operation::Create), 4);
    }

    #[test]
    fn test_execute_sequential_reports_failures() {
        let mock = MockClient::new();
        mock.fail_next(
            Operation::Create,
            reconcile::Error::transport("ssh_key", "timed out"),
        );
        let reconciler = Reconciler::new(&mock);

        let done = execute(vec![work("a"), work("b")], 1, |i| reconciler.reconcile(i)).unwrap();

        assert!(done[0].result.is_err());
        assert!(done[0].instance.remote_id().is_none());
        assert!(done[1].result.is_ok());
    }
}
