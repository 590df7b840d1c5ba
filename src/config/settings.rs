use crate::core::difficulty::{INITIAL_BITS, MAX_BITS, MIN_BITS, RETARGET_WINDOW, TARGET_BLOCK_TIME};
use crate::core::issuance::DEFAULT_LEARNING_RATE;
use crate::core::monetary::{
    BASE_SUBSIDY, GENESIS_ADDRESS, GENESIS_ALLOCATION, MAX_SUBSIDY, MIN_SUBSIDY,
};
use crate::core::{IssuancePolicy, LedgerConfig};
use crate::error::{LedgerError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "ramia.toml";
pub const DEFAULT_DATADIR: &str = "./ramia_data";

const DATADIR_KEY: &str = "RAMIA_DATADIR";
const BITS_KEY: &str = "RAMIA_BITS";
const PERSIST_MEMPOOL_KEY: &str = "RAMIA_PERSIST_MEMPOOL";

/// Settings for a ledger process, read from TOML with environment overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub datadir: PathBuf,
    pub initial_bits: u32,
    pub target_block_time: u64,
    pub retarget_window: u64,
    pub genesis_address: String,
    pub genesis_amount: u64,
    pub base_subsidy: u64,
    pub min_subsidy: u64,
    pub max_subsidy: u64,
    pub learning_rate: f64,
    pub persist_mempool: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            datadir: PathBuf::from(DEFAULT_DATADIR),
            initial_bits: INITIAL_BITS,
            target_block_time: TARGET_BLOCK_TIME,
            retarget_window: RETARGET_WINDOW,
            genesis_address: GENESIS_ADDRESS.to_string(),
            genesis_amount: GENESIS_ALLOCATION,
            base_subsidy: BASE_SUBSIDY,
            min_subsidy: MIN_SUBSIDY,
            max_subsidy: MAX_SUBSIDY,
            learning_rate: DEFAULT_LEARNING_RATE,
            // the CLI runs one command per process, so send and mine must share pending txs
            persist_mempool: true,
        }
    }
}

impl Config {
    /// Load settings for the CLI.
    ///
    /// An explicit `path` must exist. Without one, `./ramia.toml` is read if
    /// present and defaults are used otherwise. Environment overrides are
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Config::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        debug!("Reading configuration from {}", path.display());
        let raw = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Config> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }

    // lookup is env::var in production and a map in tests
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATADIR_KEY) {
            self.datadir = PathBuf::from(dir);
        }
        if let Some(bits) = lookup(BITS_KEY) {
            self.initial_bits = bits
                .trim()
                .parse()
                .map_err(|_| LedgerError::Config(format!("{BITS_KEY} is not a number: {bits}")))?;
        }
        if let Some(flag) = lookup(PERSIST_MEMPOOL_KEY) {
            self.persist_mempool = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(LedgerError::Config(format!(
                        "{PERSIST_MEMPOOL_KEY} must be true or false, got {flag}"
                    )))
                }
            };
        }
        Ok(())
    }

    pub fn with_datadir(mut self, datadir: impl Into<PathBuf>) -> Config {
        self.datadir = datadir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BITS..=MAX_BITS).contains(&self.initial_bits) {
            return Err(LedgerError::Config(format!(
                "initial_bits must be between {MIN_BITS} and {MAX_BITS}"
            )));
        }
        if self.target_block_time == 0 || self.retarget_window == 0 {
            return Err(LedgerError::Config(
                "target_block_time and retarget_window must be positive".to_string(),
            ));
        }
        if self.min_subsidy > self.max_subsidy {
            return Err(LedgerError::Config(
                "min_subsidy exceeds max_subsidy".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() {
            return Err(LedgerError::Config("learning_rate must be finite".to_string()));
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            initial_bits: self.initial_bits,
            target_block_time: self.target_block_time,
            retarget_window: self.retarget_window,
            genesis_address: self.genesis_address.clone(),
            genesis_amount: self.genesis_amount,
            policy: IssuancePolicy::new(self.base_subsidy, self.min_subsidy, self.max_subsidy)
                .with_learning_rate(self.learning_rate),
            persist_mempool: self.persist_mempool,
        }
    }
}
