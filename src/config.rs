//! Run configuration loaded from `criticality.toml` plus inventory
//! credentials taken from the environment.
//!
//! [`CriticalityConfig`] holds the asset types to score, the weights and the
//! call timeouts. Values absent from the file fall back to defaults, and CLI
//! flags are layered on top with [`CriticalityConfig::apply_overrides`].
//! Credentials are never read from the file.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::CriticalityError;
use crate::scoring::Weights;

/// Default file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "criticality.toml";

pub const ACCOUNT_ENV: &str = "J1_ACCOUNT";
pub const API_KEY_ENV: &str = "J1_API_KEY";
pub const REGION_ENV: &str = "J1_REGION";

/// Top-level configuration loaded from `criticality.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CriticalityConfig {
    /// Asset types (graph node classes) to score.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Scoring weights. A missing table means the defaults.
    #[serde(default = "default_weights")]
    pub weights: Option<Weights>,

    /// Deadline for each per-asset-type query.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,

    /// Deadline for the whole synchronization job.
    #[serde(default = "default_upload_timeout_secs")]
    pub upload_timeout_secs: u64,
}

fn default_assets() -> Vec<String> {
    vec!["Device".to_string(), "CodeRepo".to_string()]
}

fn default_weights() -> Option<Weights> {
    Some(Weights::default())
}

fn default_query_timeout_secs() -> u64 {
    60
}

fn default_upload_timeout_secs() -> u64 {
    120
}

impl Default for CriticalityConfig {
    fn default() -> Self {
        Self {
            assets: default_assets(),
            weights: default_weights(),
            query_timeout_secs: default_query_timeout_secs(),
            upload_timeout_secs: default_upload_timeout_secs(),
        }
    }
}

impl CriticalityConfig {
    /// Loads configuration from `path`, or from `criticality.toml` in the
    /// current directory when no path is given. An explicit path must exist;
    /// a missing default file just means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = toml::from_str::<CriticalityConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// A zero timeout would fail every query and upload before it starts.
    fn validate(&self) -> Result<()> {
        if self.query_timeout_secs == 0 {
            bail!("query_timeout_secs must be at least 1");
        }
        if self.upload_timeout_secs == 0 {
            bail!("upload_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Layers command-line values over the file. A non-empty asset list
    /// replaces the configured one; each weight flag replaces one field.
    pub fn apply_overrides(
        &mut self,
        assets: &[String],
        age_weight: Option<i64>,
        dependency_weight: Option<i64>,
    ) {
        if !assets.is_empty() {
            self.assets = assets.to_vec();
        }
        if age_weight.is_some() || dependency_weight.is_some() {
            let weights = self.weights.get_or_insert_with(Weights::default);
            if let Some(age) = age_weight {
                weights.age_in_days = age;
            }
            if let Some(deps) = dependency_weight {
                weights.dependencies = deps;
            }
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload_timeout_secs)
    }
}

/// Inventory account credentials.
#[derive(Clone)]
pub struct Credentials {
    pub account_id: String,
    pub api_key: String,
    pub region: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    /// Reads `J1_ACCOUNT`, `J1_API_KEY` and `J1_REGION` from the process environment.
    pub fn from_env() -> Result<Self, CriticalityError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves each key through `lookup`. Unset and empty values are both
    /// reported as missing, naming the first offending key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CriticalityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| CriticalityError::MissingConfig(key.to_string()))
        };

        Ok(Self {
            account_id: require(ACCOUNT_ENV)?,
            api_key: require(API_KEY_ENV)?,
            region: require(REGION_ENV)?,
        })
    }
}
