//! Block and transaction validation.
//!
//! Everything here is a pure function of its inputs: the chain tip, the
//! ledger's current difficulty, the mempool size and the issuance policy.
//! Rules are checked in a fixed order and the first failure is reported.

use crate::core::{Block, IssuancePolicy, NetworkMetrics, ProofOfWork, Transaction, TX_VERSION};
use crate::error::{Rejection, Result};

/// Decides whether a transaction's inputs are allowed to spend.
///
/// Inputs carry an opaque `sig` placeholder; a signature scheme plugs in
/// here without touching the rest of the ledger.
pub trait Authorizer: Send {
    fn authorize(&self, tx: &Transaction) -> std::result::Result<(), String>;
}

/// Accepts every transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _tx: &Transaction) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// What a candidate block is checked against.
pub struct ValidationContext<'a> {
    pub tip: &'a Block,
    pub tip_hash: &'a str,
    pub current_bits: u32,
    pub mempool_size: usize,
    pub policy: &'a IssuancePolicy,
    pub authorizer: &'a dyn Authorizer,
}

/// Structural sanity of a single transaction. Balances are not consulted.
///
/// The authorizer is asked about every transaction except a coinbase, which
/// has no spender.
pub fn verify_tx_basic(
    tx: &Transaction,
    authorizer: &dyn Authorizer,
) -> std::result::Result<(), Rejection> {
    // fee >= 0 and amount >= 0 hold by construction (unsigned)
    if tx.get_version() != TX_VERSION {
        return Err(Rejection::UnsupportedTxVersion);
    }
    if tx.get_vout().is_empty() {
        return Err(Rejection::NoOutputs);
    }
    for output in tx.get_vout() {
        if output.get_value() == 0 {
            return Err(Rejection::NonpositiveOutput);
        }
        if output.get_to_addr().is_empty() {
            return Err(Rejection::EmptyRecipient);
        }
    }
    if !tx.is_coinbase() {
        authorizer.authorize(tx).map_err(Rejection::Unauthorized)?;
    }
    Ok(())
}

/// Total fees paid by the non-coinbase transactions of a block.
pub fn collected_fees(txs: &[Transaction]) -> std::result::Result<u64, Rejection> {
    txs.iter()
        .skip(1)
        .try_fold(0u64, |acc, tx| acc.checked_add(tx.get_fee()))
        .ok_or(Rejection::AmountOverflow)
}

/// Check `block` as the next block on top of `ctx.tip`.
pub fn validate_block(ctx: &ValidationContext<'_>, block: &Block) -> Result<()> {
    let header = block.get_header();
    let tip = ctx.tip.get_header();

    if Some(header.get_height()) != tip.get_height().checked_add(1) {
        return Err(Rejection::BadHeight.into());
    }
    if header.get_prev_hash() != ctx.tip_hash {
        return Err(Rejection::BadPrevHash.into());
    }
    // no upper bound on timestamps is enforced
    if header.get_timestamp() < tip.get_timestamp() {
        return Err(Rejection::TimeWentBackwards.into());
    }
    if header.get_bits() != ctx.current_bits {
        return Err(Rejection::UnexpectedBits.into());
    }
    if !ProofOfWork::validate(header)? {
        return Err(Rejection::BadPow.into());
    }
    if !block.verify_merkle_root()? {
        return Err(Rejection::BadMerkleRoot.into());
    }

    let txs = block.get_transactions();
    let Some(first) = txs.first() else {
        return Err(Rejection::EmptyBlock.into());
    };
    if !first.is_coinbase() {
        return Err(Rejection::FirstTxNotCoinbase.into());
    }

    for tx in txs {
        verify_tx_basic(tx, ctx.authorizer).map_err(|why| Rejection::TxInvalid(Box::new(why)))?;
    }

    let fees = collected_fees(txs)?;
    let coinbase_out = first.total_output().ok_or(Rejection::AmountOverflow)?;
    let metrics = NetworkMetrics::observe(txs.len() - 1, fees, ctx.mempool_size);
    let subsidy = ctx.policy.predict(&metrics);
    let max_coinbase = subsidy.checked_add(fees).ok_or(Rejection::AmountOverflow)?;

    if coinbase_out > max_coinbase {
        return Err(Rejection::CoinbasePaysTooMuch.into());
    }
    Ok(())
}
