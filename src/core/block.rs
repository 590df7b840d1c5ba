use crate::core::{MerkleProof, MerkleTree, Transaction};
use crate::error::Result;
use crate::utils::{canonical_encode, sha256_hex};
use serde::{Deserialize, Serialize};

/// `prev_hash` of the genesis block: 64 hex zeros.
pub const GENESIS_PREV_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

pub const BLOCK_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    version: u32,
    prev_hash: String,
    merkle_root: String,
    timestamp: u64,
    height: u64,
    bits: u32, // required count of leading hex zeros in the block hash
    nonce: u64,
}

impl BlockHeader {
    pub fn new(
        prev_hash: &str,
        merkle_root: &str,
        timestamp: u64,
        height: u64,
        bits: u32,
    ) -> BlockHeader {
        BlockHeader {
            version: BLOCK_VERSION,
            prev_hash: prev_hash.to_string(),
            merkle_root: merkle_root.to_string(),
            timestamp,
            height,
            bits,
            nonce: 0,
        }
    }

    /// Hex SHA-256 of the canonical encoding of every header field.
    pub fn hash(&self) -> Result<String> {
        Ok(sha256_hex(&canonical_encode(self)?))
    }

    /// Copy of this header with a different nonce.
    pub fn with_nonce(&self, nonce: u64) -> BlockHeader {
        BlockHeader {
            nonce,
            ..self.clone()
        }
    }

    pub fn with_timestamp(&self, timestamp: u64) -> BlockHeader {
        BlockHeader {
            timestamp,
            ..self.clone()
        }
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn get_prev_hash(&self) -> &str {
        self.prev_hash.as_str()
    }

    pub fn get_merkle_root(&self) -> &str {
        self.merkle_root.as_str()
    }

    pub fn get_timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn get_bits(&self) -> u32 {
        self.bits
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    header: BlockHeader,
    txs: Vec<Transaction>,
}

impl Block {
    pub fn new(header: BlockHeader, txs: Vec<Transaction>) -> Block {
        Block { header, txs }
    }

    /// Assemble an unmined block (nonce 0) committing to `txs`.
    pub fn assemble(
        prev_hash: &str,
        txs: Vec<Transaction>,
        timestamp: u64,
        height: u64,
        bits: u32,
    ) -> Result<Block> {
        let merkle_root = Self::calculate_merkle_root(&txs)?;
        let header = BlockHeader::new(prev_hash, &merkle_root, timestamp, height, bits);
        Ok(Block { header, txs })
    }

    pub fn block_hash(&self) -> Result<String> {
        self.header.hash()
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.txs.as_slice()
    }

    pub fn get_height(&self) -> u64 {
        self.header.get_height()
    }

    pub fn get_timestamp(&self) -> u64 {
        self.header.get_timestamp()
    }

    /// Same transactions under a different header.
    pub fn with_header(&self, header: BlockHeader) -> Block {
        Block {
            header,
            txs: self.txs.clone(),
        }
    }

    pub fn txids(&self) -> Result<Vec<String>> {
        self.txs.iter().map(Transaction::txid).collect()
    }

    /// Sum of the coinbase outputs, `None` when there is no coinbase or it overflows.
    pub fn coinbase_total(&self) -> Option<u64> {
        self.txs
            .first()
            .filter(|tx| tx.is_coinbase())
            .and_then(Transaction::total_output)
    }

    /// Calculate Merkle root for a list of transactions
    pub fn calculate_merkle_root(txs: &[Transaction]) -> Result<String> {
        let txids = txs.iter().map(Transaction::txid).collect::<Result<Vec<_>>>()?;
        MerkleTree::merkle_root(&txids)
    }

    /// Verify that the block's Merkle root matches its transactions
    pub fn verify_merkle_root(&self) -> Result<bool> {
        Ok(Self::calculate_merkle_root(&self.txs)? == self.header.get_merkle_root())
    }

    /// Generate a Merkle proof for a transaction in this block
    pub fn merkle_proof(&self, transaction_index: usize) -> Result<MerkleProof> {
        MerkleTree::generate_proof(&self.txids()?, transaction_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coinbase_only(height: u64) -> Block {
        let coinbase = Transaction::new_coinbase_tx("miner", 50, height, "coinbase");
        Block::assemble(GENESIS_PREV_HASH, vec![coinbase], 1_700_000_000, height, 1).unwrap()
    }

    #[test]
    fn test_header_hash_matches_canonical_json() {
        let header = BlockHeader::new(GENESIS_PREV_HASH, "ab", 1_700_000_000, 0, 5);
        let encoded = String::from_utf8(canonical_encode(&header).unwrap()).unwrap();
        assert_eq!(
            encoded,
            format!(
                r#"{{"bits":5,"height":0,"merkle_root":"ab","nonce":0,"prev_hash":"{GENESIS_PREV_HASH}","timestamp":1700000000,"version":1}}"#
            )
        );
        assert_eq!(header.hash().unwrap(), sha256_hex(encoded.as_bytes()));
    }

    #[test]
    fn test_nonce_changes_hash_only_through_header() {
        let block = coinbase_only(1);
        let header = block.get_header().with_nonce(42);
        assert_eq!(header.get_nonce(), 42);
        assert_ne!(header.hash().unwrap(), block.block_hash().unwrap());

        let remined = block.with_header(header);
        assert_eq!(remined.get_transactions(), block.get_transactions());
    }

    #[test]
    fn test_assembled_block_commits_to_its_transactions() {
        let block = coinbase_only(3);
        assert!(block.verify_merkle_root().unwrap());
        assert_eq!(block.coinbase_total(), Some(50));

        let proof = block.merkle_proof(0).unwrap();
        assert!(MerkleTree::verify_proof(&proof).unwrap());
        assert_eq!(proof.merkle_root, block.get_header().get_merkle_root());
    }

    #[test]
    fn test_block_json_shape() {
        let block = coinbase_only(0);
        let value = serde_json::to_value(&block).unwrap();
        assert!(value["header"]["merkle_root"].is_string());
        assert_eq!(value["txs"][0]["vin"][0]["from_addr"], "COINBASE");
        assert_eq!(value["txs"][0]["vout"][0]["amount"], 50);

        let back: Block = serde_json::from_value(value).unwrap();
        assert_eq!(back, block);
    }
}
