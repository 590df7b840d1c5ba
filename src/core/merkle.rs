use crate::error::{LedgerError, Result};
use crate::utils::{hex_decode, sha256_digest, sha256_hex};
use data_encoding::HEXLOWER;
use serde::{Deserialize, Serialize};

/// Merkle commitment over an ordered list of transaction ids.
///
/// Every layer with an odd number of nodes duplicates its last node before
/// pairing, and at least one round of pairing always happens, so a single
/// txid commits as `sha256(txid || txid)`. Because of the duplication rule
/// `[a, b, c]` and `[a, b, c, c]` share a root.
pub struct MerkleTree;

/// Merkle proof for transaction inclusion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Transaction id being proven
    pub txid: String,
    /// Root the proof should reproduce
    pub merkle_root: String,
    /// Sibling hashes from the leaf level upward
    pub proof_path: Vec<ProofElement>,
    /// Index of the transaction in the block
    pub transaction_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofElement {
    /// Sibling hash (hex)
    pub hash: String,
    /// Direction: true if sibling is on the right, false if on the left
    pub is_right: bool,
}

impl MerkleTree {
    /// Root digest (hex) over `txids`; the empty list commits to `sha256("")`.
    pub fn merkle_root(txids: &[String]) -> Result<String> {
        if txids.is_empty() {
            return Ok(sha256_hex(b""));
        }

        let mut layer = Self::decode_leaves(txids)?;
        loop {
            layer = Self::next_layer(layer);
            if layer.len() == 1 {
                break;
            }
        }
        Ok(HEXLOWER.encode(&layer[0]))
    }

    /// Build the inclusion proof for the txid at `transaction_index`.
    pub fn generate_proof(txids: &[String], transaction_index: usize) -> Result<MerkleProof> {
        if transaction_index >= txids.len() {
            return Err(LedgerError::Corrupt(format!(
                "Transaction index {} out of bounds ({} transactions)",
                transaction_index,
                txids.len()
            )));
        }

        let mut layer = Self::decode_leaves(txids)?;
        let mut index = transaction_index;
        let mut proof_path = Vec::new();

        loop {
            if layer.len() % 2 == 1 {
                let last = layer[layer.len() - 1].clone();
                layer.push(last);
            }
            let sibling = index ^ 1;
            proof_path.push(ProofElement {
                hash: HEXLOWER.encode(&layer[sibling]),
                is_right: index % 2 == 0,
            });
            index /= 2;
            layer = Self::next_layer(layer);
            if layer.len() == 1 {
                break;
            }
        }

        Ok(MerkleProof {
            txid: txids[transaction_index].to_ascii_lowercase(),
            merkle_root: HEXLOWER.encode(&layer[0]),
            proof_path,
            transaction_index,
        })
    }

    /// Recompute the root along the proof path and compare.
    pub fn verify_proof(proof: &MerkleProof) -> Result<bool> {
        let mut current = hex_decode(&proof.txid)?;

        for element in &proof.proof_path {
            let sibling = hex_decode(&element.hash)?;
            current = if element.is_right {
                Self::hash_pair(&current, &sibling)
            } else {
                Self::hash_pair(&sibling, &current)
            };
        }

        Ok(HEXLOWER.encode(&current) == proof.merkle_root.to_ascii_lowercase())
    }

    fn decode_leaves(txids: &[String]) -> Result<Vec<Vec<u8>>> {
        txids.iter().map(|txid| hex_decode(txid)).collect()
    }

    fn next_layer(mut layer: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
        if layer.len() % 2 == 1 {
            let last = layer[layer.len() - 1].clone();
            layer.push(last);
        }
        layer
            .chunks(2)
            .map(|pair| Self::hash_pair(&pair[0], &pair[1]))
            .collect()
    }

    fn hash_pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut combined = Vec::with_capacity(left.len() + right.len());
        combined.extend_from_slice(left);
        combined.extend_from_slice(right);
        sha256_digest(&combined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tag: &str) -> String {
        sha256_hex(tag.as_bytes())
    }

    fn raw(txid: &str) -> Vec<u8> {
        hex_decode(txid).unwrap()
    }

    fn pair(left: &[u8], right: &[u8]) -> Vec<u8> {
        MerkleTree::hash_pair(left, right)
    }

    #[test]
    fn test_empty_list_commits_to_empty_hash() {
        assert_eq!(MerkleTree::merkle_root(&[]).unwrap(), sha256_hex(b""));
    }

    #[test]
    fn test_single_leaf_is_hashed_with_itself() {
        let a = leaf("a");
        let expected = HEXLOWER.encode(&pair(&raw(&a), &raw(&a)));
        assert_eq!(MerkleTree::merkle_root(&[a]).unwrap(), expected);
    }

    #[test]
    fn test_two_leaves() {
        let (a, b) = (leaf("a"), leaf("b"));
        let expected = HEXLOWER.encode(&pair(&raw(&a), &raw(&b)));
        assert_eq!(MerkleTree::merkle_root(&[a, b]).unwrap(), expected);
    }

    #[test]
    fn test_three_leaves_duplicate_the_last() {
        let (a, b, c) = (leaf("a"), leaf("b"), leaf("c"));
        let ab = pair(&raw(&a), &raw(&b));
        let cc = pair(&raw(&c), &raw(&c));
        let expected = HEXLOWER.encode(&pair(&ab, &cc));
        assert_eq!(
            MerkleTree::merkle_root(&[a.clone(), b.clone(), c.clone()]).unwrap(),
            expected
        );
        // the known weakness: a trailing duplicate commits to the same root
        assert_eq!(MerkleTree::merkle_root(&[a, b, c.clone(), c]).unwrap(), expected);
    }

    #[test]
    fn test_four_leaves() {
        let (a, b, c, d) = (leaf("a"), leaf("b"), leaf("c"), leaf("d"));
        let ab = pair(&raw(&a), &raw(&b));
        let cd = pair(&raw(&c), &raw(&d));
        let expected = HEXLOWER.encode(&pair(&ab, &cd));
        assert_eq!(MerkleTree::merkle_root(&[a, b, c, d]).unwrap(), expected);
    }

    #[test]
    fn test_root_is_stable_and_order_sensitive() {
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|t| leaf(t)).collect();
        let first = MerkleTree::merkle_root(&ids).unwrap();
        assert_eq!(first, MerkleTree::merkle_root(&ids).unwrap());

        let mut swapped = ids.clone();
        swapped.swap(1, 2);
        assert_ne!(first, MerkleTree::merkle_root(&swapped).unwrap());

        let mut reversed = ids;
        reversed.reverse();
        assert_ne!(first, MerkleTree::merkle_root(&reversed).unwrap());
    }

    #[test]
    fn test_invalid_hex_is_an_error() {
        assert!(MerkleTree::merkle_root(&["not-hex".to_string()]).is_err());
    }

    #[test]
    fn test_proofs_verify_for_every_leaf() {
        for count in 1..=7 {
            let ids: Vec<String> = (0..count).map(|i| leaf(&i.to_string())).collect();
            let root = MerkleTree::merkle_root(&ids).unwrap();
            for index in 0..count {
                let proof = MerkleTree::generate_proof(&ids, index).unwrap();
                assert_eq!(proof.merkle_root, root);
                assert!(MerkleTree::verify_proof(&proof).unwrap());
            }
        }
    }

    #[test]
    fn test_tampered_proof_fails() {
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|t| leaf(t)).collect();
        let mut proof = MerkleTree::generate_proof(&ids, 1).unwrap();
        proof.txid = leaf("z");
        assert!(!MerkleTree::verify_proof(&proof).unwrap());

        assert!(MerkleTree::generate_proof(&ids, 3).is_err());
    }
}
