use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use reconcile::{AttributeSet, ResourceInstance, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::address::Address;

/// Current state file format version
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Persisted remote identities and snapshots, keyed by address
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    pub version: u32,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,

    /// Tracked resources by `kind.name`
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

/// State of one tracked resource
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResourceState {
    pub kind: String,

    /// Identifier assigned by the API on create
    pub remote_id: String,

    /// Last observed remote representation
    #[serde(default)]
    pub observed: Option<AttributeSet>,

    pub updated_at: DateTime<Utc>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            resources: BTreeMap::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return default if file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file does not exist, using default state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            bail!(
                "State file {} has version {}, this wpe understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!("Loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk, replacing the previous file in one rename
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.version = STATE_VERSION;
        self.last_updated = Utc::now();
        let content =
            serde_json::to_string_pretty(&self).context("Failed to serialize state to JSON")?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content + "\n")
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceState> {
        self.resources.get(&address.to_string())
    }

    /// Tracked addresses, sorted
    pub fn addresses(&self) -> Result<Vec<Address>> {
        self.resources.keys().map(|key| Address::parse(key)).collect()
    }

    /// Rebuild an instance from stored state, or a fresh one if untracked.
    pub fn instance(
        &self,
        address: &Address,
        kind: &'static ResourceKind,
        desired: AttributeSet,
    ) -> ResourceInstance {
        match self.get(address) {
            Some(entry) => ResourceInstance::existing(
                kind,
                entry.remote_id.clone(),
                desired,
                entry.observed.clone(),
            ),
            None => ResourceInstance::new(kind, desired),
        }
    }

    /// Store what a reconciler call left in the instance.
    ///
    /// An instance without an identifier is no longer tracked.
    pub fn record(&mut self, address: &Address, instance: ResourceInstance) {
        let kind = instance.kind().name.to_string();
        match instance.into_state() {
            (Some(remote_id), observed) => {
                let entry = ResourceState {
                    kind,
                    remote_id,
                    observed,
                    updated_at: Utc::now(),
                };
                self.resources.insert(address.to_string(), entry);
            }
            (None, _) => {
                self.resources.remove(&address.to_string());
            }
        }
    }

    /// Stop tracking a resource
    pub fn remove(&mut self, address: &Address) -> Option<ResourceState> {
        self.resources.remove(&address.to_string())
    }
}
