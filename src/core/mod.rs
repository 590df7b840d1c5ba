//! Core ledger functionality
//!
//! This module contains the fundamental ledger components including
//! blocks, transactions, validation, the account state transition,
//! proof-of-work, difficulty retargeting and the issuance policy.

pub mod block;
pub mod difficulty;
pub mod issuance;
pub mod ledger;
pub mod merkle;
pub mod monetary;
pub mod proof_of_work;
pub mod state;
pub mod transaction;
pub mod validation;

pub use block::{Block, BlockHeader, BLOCK_VERSION, GENESIS_PREV_HASH};
pub use difficulty::DifficultyAdjustment;
pub use issuance::{IssuancePolicy, NetworkMetrics};
pub use ledger::{Ledger, LedgerConfig, SharedLedger};
pub use merkle::{MerkleProof, MerkleTree, ProofElement};
pub use monetary::{
    BASE_SUBSIDY, DEFAULT_TRANSACTION_FEE, GENESIS_ADDRESS, GENESIS_ALLOCATION, MAX_SUBSIDY,
    MIN_SUBSIDY,
};
pub use proof_of_work::ProofOfWork;
pub use state::{apply_block, balance_of, Balances};
pub use transaction::{TXInput, TXOutput, Transaction, COINBASE_SENDER, TX_VERSION};
pub use validation::{validate_block, verify_tx_basic, AllowAll, Authorizer, ValidationContext};
