//! Data storage and persistence
//!
//! The in-memory pool of pending transactions and the file-backed store for
//! accepted blocks and the balance snapshot.

pub mod ledger_store;
pub mod memory_pool;

pub use ledger_store::{LedgerStore, StateSnapshot, BLOCKS_FILE, MEMPOOL_FILE, STATE_FILE};
pub use memory_pool::MemoryPool;
