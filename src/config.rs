//! Configuration management for PatientChain

use crate::error::{ChainError, Result};
use crate::miner::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "patientchain.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    /// Leading hex zeros a proof digest must have.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_genesis_proof")]
    pub genesis_proof: u64,
    #[serde(default = "default_genesis_previous_hash")]
    pub genesis_previous_hash: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            genesis_proof: default_genesis_proof(),
            genesis_previous_hash: default_genesis_previous_hash(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            timeout_ms: None,
        }
    }
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_genesis_proof() -> u64 {
    100
}

fn default_genesis_previous_hash() -> String {
    "1".to_string()
}

fn default_threads() -> usize {
    1
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ledger.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::Config(format!(
                "ledger.difficulty must be between 0 and {}, got {}",
                MAX_DIFFICULTY, self.ledger.difficulty
            )));
        }
        if self.ledger.genesis_previous_hash.is_empty() {
            return Err(ChainError::Config(
                "ledger.genesis_previous_hash must not be empty".to_string(),
            ));
        }
        if self.miner.threads == 0 {
            return Err(ChainError::Config("miner.threads must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Loads `patientchain.toml` from the working directory, using defaults when it is absent.
pub fn load_config() -> Result<Config> {
    load_config_or_default(DEFAULT_CONFIG_FILE)
}

/// Parses `path` if it exists, otherwise returns [`Config::default`].
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<Config> {
    if !path.as_ref().exists() {
        return Ok(Config::default());
    }
    load_config_from(path)
}

pub fn load_config_from(path: impl AsRef<Path>) -> Result<Config> {
    let config_str = fs::read_to_string(path.as_ref())?;
    Config::from_toml_str(&config_str)
}
