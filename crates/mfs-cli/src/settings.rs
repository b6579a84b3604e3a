//! Layered CLI configuration

use config::{Config, ConfigError, Environment, File};
use mfs_adapter::OperationalConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything the `mfs` binary needs to build an adapter.
///
/// Loaded from an optional TOML file (`mfs.toml` in the working directory
/// unless `--config` names one), then `MFS__*` environment variables, e.g.
/// `MFS__API_URL` or `MFS__ADAPTER__GATEWAY__STYLE`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Kubo RPC endpoint
    pub api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Adapter root inside MFS
    pub prefix: String,
    /// Default operational config
    pub adapter: OperationalConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5001".to_string(),
            timeout_secs: 30,
            prefix: String::new(),
            adapter: OperationalConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("mfs").required(false),
        };

        Self::build(file, Environment::with_prefix("MFS").separator("__").try_parsing(true))
    }

    fn build(
        file: File<config::FileSourceFile, config::FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
