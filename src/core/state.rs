// State transition: applying an accepted block to the account balances
// A block either applies completely or leaves the balances untouched

use crate::core::{Block, Transaction};
use crate::error::Rejection;
use std::collections::BTreeMap;

/// Address -> balance. A missing address has balance 0.
pub type Balances = BTreeMap<String, u64>;

/// Balance of `address`, 0 when unknown.
pub fn balance_of(balances: &Balances, address: &str) -> u64 {
    balances.get(address).copied().unwrap_or(0)
}

/// Apply every transaction of `block` in order.
///
/// The first transaction, when it is a coinbase, only credits. Every other
/// transaction debits its single sender by outputs + fee and credits its
/// recipients. On the first failure the balances are restored to what they
/// were before the call and the whole block is refused.
pub fn apply_block(balances: &mut Balances, block: &Block) -> Result<(), Rejection> {
    let snapshot = balances.clone();

    for (index, tx) in block.get_transactions().iter().enumerate() {
        let applied = if index == 0 && tx.is_coinbase() {
            credit_outputs(balances, tx)
        } else {
            apply_transfer(balances, tx)
        };

        if let Err(why) = applied {
            *balances = snapshot;
            return Err(Rejection::ApplyFailed(Box::new(why)));
        }
    }
    Ok(())
}

fn apply_transfer(balances: &mut Balances, tx: &Transaction) -> Result<(), Rejection> {
    let sender = tx.sender().ok_or(Rejection::UnsupportedVin)?;
    let spend = tx
        .total_output()
        .and_then(|outputs| outputs.checked_add(tx.get_fee()))
        .ok_or(Rejection::AmountOverflow)?;

    let available = balance_of(balances, sender);
    if available < spend {
        return Err(Rejection::InsufficientFunds {
            required: spend,
            available,
        });
    }
    balances.insert(sender.to_string(), available - spend);
    credit_outputs(balances, tx)
}

fn credit_outputs(balances: &mut Balances, tx: &Transaction) -> Result<(), Rejection> {
    for output in tx.get_vout() {
        let entry = balances.entry(output.get_to_addr().to_string()).or_insert(0);
        *entry = entry
            .checked_add(output.get_value())
            .ok_or(Rejection::AmountOverflow)?;
    }
    Ok(())
}
