use anyhow::{Context, Result, bail};
use reconcile::{AttributeSet, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::address::{Address, valid_name};
use crate::retry::RetryConfig;

/// Config file name looked up in the working directory
pub const CONFIG_FILE: &str = "wpe.toml";

/// Default state file, relative to the config file
pub const DEFAULT_STATE_FILE: &str = "wpe.state.json";

/// Get the user config directory path (~/.config/wpe)
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("wpe"))
}

// ============================================================================
// Config Schema
// ============================================================================

/// The `wpe.toml` configuration
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// Declared resources, in file order
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: wpengine::DEFAULT_BASE_URL.to_string(),
            timeout_secs: wpengine::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    pub path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_STATE_FILE.to_string(),
        }
    }
}

/// One `[[resource]]` block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub attributes: AttributeSet,
}

/// A declared resource resolved against the kind catalogue
#[derive(Debug, Clone)]
pub struct Declared {
    pub address: Address,
    pub kind: &'static ResourceKind,
    pub desired: AttributeSet,
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Find the config file: explicit path, then ./wpe.toml, then ~/.config/wpe/wpe.toml
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        let user = config_dir()?.join(CONFIG_FILE);
        if user.exists() {
            return Ok(user);
        }

        bail!("No {CONFIG_FILE} found in the current directory or {}", config_dir()?.display())
    }

    /// Load and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        log::debug!(
            "Loaded {} resource(s) from {}",
            config.resources.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid TOML format")
    }

    /// Resolve declared resources against the catalogue.
    ///
    /// Kinds must exist and names must be unique per kind. Attributes are
    /// validated per resource by the reconciler, so one bad block does not
    /// stop commands aimed at other resources.
    pub fn declared(&self) -> Result<Vec<Declared>> {
        let mut seen = HashSet::new();
        let mut declared = Vec::with_capacity(self.resources.len());

        for resource in &self.resources {
            let kind = wpengine::CATALOG.get(&resource.kind).with_context(|| {
                format!(
                    "Unknown resource kind '{}' (known: {})",
                    resource.kind,
                    wpengine::CATALOG.names().collect::<Vec<_>>().join(", ")
                )
            })?;
            if !valid_name(&resource.name) {
                bail!(
                    "Invalid name '{}' for {} (use letters, digits, '-' and '_')",
                    resource.name,
                    resource.kind
                );
            }

            let address = Address::new(&resource.kind, &resource.name);
            if !seen.insert(address.clone()) {
                bail!("Duplicate resource {address}");
            }

            declared.push(Declared {
                address,
                kind,
                desired: resource.attributes.clone(),
            });
        }

        Ok(declared)
    }

    /// State file path; `~` is expanded and relative paths are resolved
    /// against the directory holding the config file.
    pub fn state_path(&self, config_path: &Path) -> PathBuf {
        let expanded = PathBuf::from(shellexpand::tilde(&self.state.path).as_ref());
        if expanded.is_absolute() {
            return expanded;
        }
        config_path
            .parent()
            .map_or_else(|| expanded.clone(), |dir| dir.join(&expanded))
    }
}
