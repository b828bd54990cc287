//! Launch policy configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. `--policy <file>` given on the command line
//! 2. `.launchgate/policy.yml` in the working directory
//! 3. `~/.config/launchgate/policy.yml` (platform config dir)
//! 4. Built-in defaults
//!
//! ```yaml
//! run_in_sandbox: false
//! expiring_soon_days: 180
//! trust_store:
//!   trusted_roots: ["sha256:..."]
//!   trusted_publishers: ["sha256:..."]
//!   revoked: []
//! ```

use crate::error::LaunchError;
use crate::signing::StaticTrustStore;
use anyhow::{anyhow, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Policy applied to every launch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPolicy {
    /// Run everything sandboxed; no trust decision is made
    #[serde(default)]
    pub run_in_sandbox: bool,

    /// Certificates expiring within this many days produce a warning
    #[serde(default = "default_expiring_soon_days")]
    pub expiring_soon_days: u32,

    #[serde(default)]
    pub trust_store: StaticTrustStore,
}

fn default_expiring_soon_days() -> u32 {
    180
}

impl Default for LaunchPolicy {
    fn default() -> Self {
        LaunchPolicy {
            run_in_sandbox: false,
            expiring_soon_days: default_expiring_soon_days(),
            trust_store: StaticTrustStore::default(),
        }
    }
}

impl LaunchPolicy {
    /// Load the project policy from `.launchgate/policy.yml`
    pub fn load(project_dir: &Path) -> Result<Self, LaunchError> {
        Self::load_from(&project_dir.join(".launchgate").join("policy.yml"))
    }

    /// Load a policy file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, LaunchError> {
        if !path.exists() {
            debug!("No launch policy at {} - using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| LaunchError::PolicyRead {
            path: path.to_path_buf(),
            source,
        })?;

        let policy: LaunchPolicy =
            serde_yaml_ng::from_str(&content).map_err(|source| LaunchError::PolicyParse {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded launch policy from {}", path.display());
        Ok(policy)
    }

    /// Resolve the policy from an explicit override, the project, or the user config dir
    pub fn discover(project_dir: &Path, cli_override: Option<PathBuf>) -> Result<Self> {
        if let Some(override_path) = cli_override {
            if !override_path.exists() {
                return Err(anyhow!(
                    "Launch policy does not exist: {}",
                    override_path.display()
                ));
            }
            return Ok(Self::load_from(&override_path)?);
        }

        let project_policy = project_dir.join(".launchgate").join("policy.yml");
        if project_policy.exists() {
            return Ok(Self::load_from(&project_policy)?);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let global_policy = config_dir.join("launchgate").join("policy.yml");
            if global_policy.exists() {
                return Ok(Self::load_from(&global_policy)?);
            }
        }

        debug!("No launch policy found - using defaults");
        Ok(Self::default())
    }

    pub fn expiring_window(&self) -> Duration {
        Duration::days(i64::from(self.expiring_soon_days))
    }
}
