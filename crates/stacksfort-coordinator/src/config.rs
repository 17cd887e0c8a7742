//! Coordinator configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use stacksfort_common::{Network, DEFAULT_NAMESPACE};

/// What `now` means when checking proposal expiration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockKind {
    /// Unix seconds from the system clock
    #[default]
    Unix,
    /// Block height, supplied by the caller
    BlockHeight,
}

impl FromStr for ClockKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unix" => Ok(ClockKind::Unix),
            "block-height" => Ok(ClockKind::BlockHeight),
            other => bail!("unknown clock kind {other:?} (expected unix or block-height)"),
        }
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockKind::Unix => write!(f, "unix"),
            ClockKind::BlockHeight => write!(f, "block-height"),
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Storage namespace; also names the snapshot file
    pub namespace: String,
    /// Directory holding snapshot files
    pub data_dir: PathBuf,
    /// Network used for signer recovery when no signer set says otherwise
    pub network: Network,
    /// Expiration clock
    pub clock: ClockKind,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data_dir: PathBuf::from(".stacksfort"),
            network: Network::Mainnet,
            clock: ClockKind::Unix,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from environment and `.env`
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Override fields from `STACKSFORT_*` variables
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = var("STACKSFORT_NAMESPACE") {
            if namespace.trim().is_empty() {
                bail!("STACKSFORT_NAMESPACE must not be empty");
            }
            self.namespace = namespace;
        }
        if let Some(dir) = var("STACKSFORT_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(network) = var("STACKSFORT_NETWORK") {
            self.network = network
                .parse::<Network>()
                .map_err(|e| anyhow::anyhow!("STACKSFORT_NETWORK: {e}"))?;
        }
        if let Some(clock) = var("STACKSFORT_CLOCK") {
            self.clock = clock.parse()?;
        }
        Ok(())
    }

    /// `<data_dir>/<namespace>.json`
    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.data_dir, &self.namespace)
    }
}

pub fn snapshot_path(data_dir: &Path, namespace: &str) -> PathBuf {
    data_dir.join(format!("{namespace}.json"))
}
