//! # Ramia Ledger - My Account-Model Proof-of-Work Ledger
//!
//! This is a single-node ledger I built in Rust: accounts with balances
//! instead of UTXOs, SHA-256 proof of work counted in leading hex zeros,
//! and a block subsidy that comes from a small learned policy instead of a
//! fixed halving schedule.
//! When I come back to this code, here's what I need to remember:
//!
//! ## What I Built
//! - **Canonical Encoding**: sorted-key compact JSON, hashed for txids and block hashes
//! - **Account State**: balances move atomically per block, or not at all
//! - **Validation**: an ordered list of checks, first failure wins
//! - **Difficulty**: bits move by one when the recent window is too fast or too slow
//! - **Issuance Policy**: `base + Σ wᵢ·xᵢ`, clamped, trained only when asked
//! - **Persistence**: append-only `blocks.jsonl` plus an atomically replaced `state.json`
//!
//! ## How I Organized My Code
//! - `core/`: blocks, transactions, merkle, validation, state, mining, the `Ledger` itself
//! - `storage/`: the mempool and the files in the data directory
//! - `config/`: TOML configuration with environment overrides
//! - `utils/`: hashing, hex, timestamps and the canonical JSON codec
//! - `cli/`: Command-line interface for the ledger binary
//!
//! ## When I Need to Understand Something
//! 1. Start with `main.rs` to see the CLI commands
//! 2. Look at `core/ledger.rs` for the three entry points
//! 3. Check `core/validation.rs` for the exact order blocks are checked in
//! 4. Review `core/state.rs` for how balances move
//! 5. Examine `core/issuance.rs` for how the subsidy is chosen

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use core::{
    AllowAll, Authorizer, Balances, Block, BlockHeader, DifficultyAdjustment, IssuancePolicy,
    Ledger, LedgerConfig, MerkleProof, MerkleTree, NetworkMetrics, ProofOfWork, SharedLedger,
    TXInput, TXOutput, Transaction,
};
pub use error::{LedgerError, Rejection, Result};
pub use storage::{LedgerStore, MemoryPool};
pub use utils::{canonical_encode, current_timestamp, sha256_digest, sha256_hex};
