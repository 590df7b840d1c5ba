use crate::core::{Block, BlockHeader};
use crate::error::{LedgerError, Result};
use log::{debug, info};

/// Upper bound on the required leading hex zeros (a SHA-256 hex digest has 64)
pub const MAX_BITS: u32 = 64;

pub struct ProofOfWork;

impl ProofOfWork {
    /// Whether `hash` starts with at least `bits` `'0'` characters.
    pub fn meets_target(hash: &str, bits: u32) -> bool {
        let bits = bits as usize;
        hash.len() >= bits && hash.bytes().take(bits).all(|b| b == b'0')
    }

    /// Validate proof-of-work for a header against its own `bits`
    pub fn validate(header: &BlockHeader) -> Result<bool> {
        Ok(Self::meets_target(&header.hash()?, header.get_bits()))
    }

    /// Search nonces from 0 upward until the header hash meets its target.
    ///
    /// Blocks the calling thread for the whole search; there is no way to
    /// cancel it.
    pub fn mine(template: &Block) -> Result<Block> {
        let header = template.get_header();
        info!(
            "Mining block at height {} with difficulty {}",
            header.get_height(),
            header.get_bits()
        );
        match Self::search(template, u64::MAX)? {
            Some(block) => Ok(block),
            None => Err(LedgerError::Mining(format!(
                "nonce space exhausted at height {}",
                header.get_height()
            ))),
        }
    }

    /// Like [`ProofOfWork::mine`] but gives up after `max_attempts` nonces.
    pub fn mine_bounded(template: &Block, max_attempts: u64) -> Result<Option<Block>> {
        Self::search(template, max_attempts)
    }

    fn search(template: &Block, max_attempts: u64) -> Result<Option<Block>> {
        let header = template.get_header();
        let bits = header.get_bits();
        for nonce in 0..max_attempts {
            let candidate = header.with_nonce(nonce);
            let hash = candidate.hash()?;
            if Self::meets_target(&hash, bits) {
                debug!("Found nonce {nonce} for block {hash}");
                return Ok(Some(template.with_header(candidate)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Transaction, GENESIS_PREV_HASH};

    fn create_template(bits: u32) -> Block {
        let coinbase = Transaction::new_coinbase_tx("miner", 50, 7, "coinbase");
        Block::assemble(GENESIS_PREV_HASH, vec![coinbase], 1_700_000_000, 1, bits).unwrap()
    }

    #[test]
    fn test_meets_target() {
        assert!(ProofOfWork::meets_target("00ab", 2));
        assert!(ProofOfWork::meets_target("000b", 2));
        assert!(!ProofOfWork::meets_target("0a0b", 2));
        assert!(ProofOfWork::meets_target("abcd", 0));
        assert!(!ProofOfWork::meets_target("00", 3));
    }

    #[test]
    fn test_mined_block_is_valid() {
        let template = create_template(2);
        let block = ProofOfWork::mine(&template).unwrap();

        let hash = block.block_hash().unwrap();
        assert!(hash.starts_with("00"));
        assert!(ProofOfWork::validate(block.get_header()).unwrap());
        assert_eq!(block.get_transactions(), template.get_transactions());
    }

    #[test]
    fn test_mining_returns_first_satisfying_nonce() {
        let template = create_template(1);
        let block = ProofOfWork::mine(&template).unwrap();
        let found = block.get_header().get_nonce();
        for nonce in 0..found {
            let hash = template.get_header().with_nonce(nonce).hash().unwrap();
            assert!(!ProofOfWork::meets_target(&hash, 1));
        }
    }

    #[test]
    fn test_mine_bounded_gives_up() {
        let template = create_template(MAX_BITS);
        assert!(ProofOfWork::mine_bounded(&template, 16).unwrap().is_none());
    }
}
