//! Configuration management
//!
//! Settings for the ledger process: where the data lives, the starting
//! difficulty, issuance bounds and whether pending transactions survive a
//! restart. Read from TOML, then overridden from the environment.

pub mod settings;

pub use settings::{Config, DEFAULT_CONFIG_FILE, DEFAULT_DATADIR};
