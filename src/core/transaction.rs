// This file implements the transaction model - how value moves between accounts
// Unlike a UTXO chain, every address has a balance and a transaction simply
// debits its single sender and credits its recipients

use crate::error::Result;
use crate::utils::{canonical_encode, random_nonce, sha256_hex};
use serde::{Deserialize, Serialize};

/// Sender address carried by every coinbase input
pub const COINBASE_SENDER: &str = "COINBASE";

/// The only transaction version this ledger accepts
pub const TX_VERSION: u32 = 1;

// A transaction input names the account that pays
// The sig field is a placeholder - nothing verifies it unless an Authorizer does
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TXInput {
    from_addr: String,
    #[serde(default)]
    sig: String,
}

impl TXInput {
    pub fn new(from_addr: &str) -> TXInput {
        TXInput {
            from_addr: from_addr.to_string(),
            sig: String::new(),
        }
    }

    pub fn with_sig(from_addr: &str, sig: &str) -> TXInput {
        TXInput {
            from_addr: from_addr.to_string(),
            sig: sig.to_string(),
        }
    }

    pub fn get_from_addr(&self) -> &str {
        self.from_addr.as_str()
    }

    pub fn get_sig(&self) -> &str {
        self.sig.as_str()
    }
}

// A transaction output credits an amount (in atomic units) to an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TXOutput {
    to_addr: String,
    amount: u64,
}

impl TXOutput {
    pub fn new(amount: u64, to_addr: &str) -> TXOutput {
        TXOutput {
            to_addr: to_addr.to_string(),
            amount,
        }
    }

    pub fn get_to_addr(&self) -> &str {
        self.to_addr.as_str()
    }

    pub fn get_value(&self) -> u64 {
        self.amount
    }
}

// This is the main transaction structure
// Its identity is the hash of its canonical encoding, so it has no setters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    version: u32,
    vin: Vec<TXInput>,
    vout: Vec<TXOutput>,
    fee: u64,
    nonce: u64,
    #[serde(default)]
    memo: String,
}

impl Transaction {
    pub fn new(vin: Vec<TXInput>, vout: Vec<TXOutput>, fee: u64, nonce: u64, memo: &str) -> Self {
        Self::with_version(TX_VERSION, vin, vout, fee, nonce, memo)
    }

    // I keep the version explicit here so tests and tools can build
    // transactions the validator has to refuse
    pub fn with_version(
        version: u32,
        vin: Vec<TXInput>,
        vout: Vec<TXOutput>,
        fee: u64,
        nonce: u64,
        memo: &str,
    ) -> Self {
        Transaction {
            version,
            vin,
            vout,
            fee,
            nonce,
            memo: memo.to_string(),
        }
    }

    // When I create a coinbase transaction paying newly issued value to a miner
    pub fn new_coinbase_tx(to: &str, reward: u64, nonce: u64, memo: &str) -> Transaction {
        Transaction::new(
            vec![TXInput::new(COINBASE_SENDER)],
            vec![TXOutput::new(reward, to)],
            0, // coinbase creates value, it never pays a fee
            nonce,
            memo,
        )
    }

    // Simple single-input transfer with a random nonce and an empty signature
    pub fn new_transfer(from: &str, to: &str, amount: u64, fee: u64, memo: &str) -> Transaction {
        Transaction::new(
            vec![TXInput::new(from)],
            vec![TXOutput::new(amount, to)],
            fee,
            random_nonce(),
            memo,
        )
    }

    /// Hex SHA-256 of the canonical encoding.
    pub fn txid(&self) -> Result<String> {
        Ok(sha256_hex(&canonical_encode(self)?))
    }

    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].get_from_addr() == COINBASE_SENDER
    }

    /// The paying address; `None` unless there is exactly one input.
    pub fn sender(&self) -> Option<&str> {
        match self.vin.as_slice() {
            [input] => Some(input.get_from_addr()),
            _ => None,
        }
    }

    /// Sum of all output amounts, `None` on overflow.
    pub fn total_output(&self) -> Option<u64> {
        self.vout
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.get_value()))
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn get_vin(&self) -> &[TXInput] {
        self.vin.as_slice()
    }

    pub fn get_vout(&self) -> &[TXOutput] {
        self.vout.as_slice()
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_nonce(&self) -> u64 {
        self.nonce
    }

    pub fn get_memo(&self) -> &str {
        self.memo.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txid_matches_canonical_json() {
        let tx = Transaction::new_coinbase_tx("genesis", 100_000_000_000, 0, "genesis");
        let encoded = String::from_utf8(canonical_encode(&tx).unwrap()).unwrap();
        assert_eq!(
            encoded,
            r#"{"fee":0,"memo":"genesis","nonce":0,"version":1,"vin":[{"from_addr":"COINBASE","sig":""}],"vout":[{"amount":100000000000,"to_addr":"genesis"}]}"#
        );
        assert_eq!(
            tx.txid().unwrap(),
            "043d22b8ce1fec23056f970574f6ae25c3cf645aa463aee81988fad84b776360"
        );
    }

    #[test]
    fn test_txid_changes_with_nonce() {
        let a = Transaction::new(
            vec![TXInput::new("alice")],
            vec![TXOutput::new(5, "bob")],
            1,
            1,
            "",
        );
        let b = Transaction::new(
            vec![TXInput::new("alice")],
            vec![TXOutput::new(5, "bob")],
            1,
            2,
            "",
        );
        assert_ne!(a.txid().unwrap(), b.txid().unwrap());
        assert_eq!(a.txid().unwrap(), a.clone().txid().unwrap());
    }

    #[test]
    fn test_coinbase_detection() {
        let coinbase = Transaction::new_coinbase_tx("miner", 10, 3, "coinbase");
        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.get_fee(), 0);

        let transfer = Transaction::new_transfer("alice", "bob", 10, 1, "");
        assert!(!transfer.is_coinbase());
        assert_eq!(transfer.sender(), Some("alice"));
    }

    #[test]
    fn test_sender_requires_exactly_one_input() {
        let none = Transaction::new(vec![], vec![TXOutput::new(1, "bob")], 0, 0, "");
        assert_eq!(none.sender(), None);

        let two = Transaction::new(
            vec![TXInput::new("a"), TXInput::new("b")],
            vec![TXOutput::new(1, "bob")],
            0,
            0,
            "",
        );
        assert_eq!(two.sender(), None);
        assert!(!two.is_coinbase());
    }

    #[test]
    fn test_total_output_detects_overflow() {
        let tx = Transaction::new(
            vec![TXInput::new("a")],
            vec![TXOutput::new(u64::MAX, "b"), TXOutput::new(1, "c")],
            0,
            0,
            "",
        );
        assert_eq!(tx.total_output(), None);

        let tx = Transaction::new_transfer("a", "b", 7, 0, "");
        assert_eq!(tx.total_output(), Some(7));
    }

    #[test]
    fn test_missing_memo_and_sig_default_when_loading() {
        let raw = r#"{"version":1,"vin":[{"from_addr":"a"}],"vout":[{"to_addr":"b","amount":3}],"fee":0,"nonce":9}"#;
        let tx: Transaction = serde_json::from_str(raw).unwrap();
        assert_eq!(tx.get_memo(), "");
        assert_eq!(tx.get_vin()[0].get_sig(), "");
    }
}
