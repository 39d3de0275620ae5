use std::path::PathBuf;

use anyhow::Context;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use toml::Value;

/// Loopback run parameters, the `[sim]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimConfig {
    /// Cycle budget; the run stops here even if transactions are still in flight.
    pub cycles: u64,
    /// Transactions the master issues before going quiet.
    pub txns: u64,
    pub seed: u64,
    pub log_level: u64,
    pub summary_json: Option<PathBuf>,
}

pub trait Config: DeserializeOwned + Default {
    fn from_section(section: Option<&Value>) -> anyhow::Result<Self> {
        match section {
            Some(value) => value
                .clone()
                .try_into()
                .context("cannot deserialize config"),
            None => {
                warn!("config section not found");
                Ok(Self::default())
            }
        }
    }
}

impl Config for SimConfig {}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cycles: 10000,
            txns: 16,
            seed: 0,
            log_level: 0,
            summary_json: None,
        }
    }
}
