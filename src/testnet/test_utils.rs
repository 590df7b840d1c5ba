//! Test utilities for ledger testing

use crate::core::{Block, Ledger, LedgerConfig, Transaction, GENESIS_PREV_HASH};
use tempfile::TempDir;

/// Timestamp of the first block of a synthetic chain
pub const SYNTHETIC_START: u64 = 1_700_000_000;

/// Ledger parameters for fast tests: difficulty 1 so mining takes a couple of tries
pub fn test_config() -> LedgerConfig {
    LedgerConfig {
        initial_bits: 1,
        ..LedgerConfig::default()
    }
}

/// Open a fresh ledger in a temporary directory.
/// Keep the `TempDir` alive for as long as the ledger is used.
pub fn create_test_ledger() -> (Ledger, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let ledger = Ledger::open(dir.path(), test_config()).expect("open test ledger");
    (ledger, dir)
}

/// Heights `0..n`, linked by hash, with block `i` stamped
/// `SYNTHETIC_START + i * spacing`. The blocks are not mined.
pub fn synthetic_chain(n: usize, spacing: u64) -> Vec<Block> {
    let mut chain: Vec<Block> = Vec::with_capacity(n);
    let mut prev_hash = GENESIS_PREV_HASH.to_string();
    for i in 0..n as u64 {
        let coinbase = Transaction::new_coinbase_tx("miner", 1, i, "coinbase");
        let block = Block::assemble(&prev_hash, vec![coinbase], SYNTHETIC_START + i * spacing, i, 1)
            .expect("assemble synthetic block");
        prev_hash = block.block_hash().expect("hash synthetic block");
        chain.push(block);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_chain_links() {
        let chain = synthetic_chain(5, 60);
        assert_eq!(chain.len(), 5);
        assert_eq!(chain[0].get_header().get_prev_hash(), GENESIS_PREV_HASH);
        for pair in chain.windows(2) {
            assert_eq!(
                pair[1].get_header().get_prev_hash(),
                pair[0].block_hash().unwrap()
            );
            assert_eq!(pair[1].get_timestamp() - pair[0].get_timestamp(), 60);
            assert_eq!(pair[1].get_height(), pair[0].get_height() + 1);
        }
    }

    #[test]
    fn test_create_test_ledger() {
        let (ledger, dir) = create_test_ledger();
        assert_eq!(ledger.height(), 0);
        assert_eq!(ledger.bits(), 1);
        assert_eq!(ledger.data_dir(), dir.path());
    }
}
