use crate::core::Transaction;
use std::collections::HashMap;

/// Pending transactions, ( K -> txid_hex, V => Transaction ).
///
/// Snapshots come back in arrival order, so a transfer that spends funds
/// received earlier in the same block applies after the transfer funding it.
/// There is no size cap, fee ordering or eviction.
#[derive(Debug, Clone, Default)]
pub struct MemoryPool {
    inner: HashMap<String, Transaction>,
    order: Vec<String>,
}

impl MemoryPool {
    pub fn new() -> MemoryPool {
        MemoryPool::default()
    }

    pub fn get(&self, txid: &str) -> Option<&Transaction> {
        self.inner.get(txid)
    }

    /// Insert `tx` under `txid`; returns false if that txid is already pending.
    pub fn add(&mut self, txid: String, tx: Transaction) -> bool {
        if self.inner.contains_key(&txid) {
            return false;
        }
        self.order.push(txid.clone());
        self.inner.insert(txid, tx);
        true
    }

    pub fn contains(&self, txid: &str) -> bool {
        self.inner.contains_key(txid)
    }

    pub fn remove(&mut self, txid: &str) -> Option<Transaction> {
        let removed = self.inner.remove(txid)?;
        self.order.retain(|id| id != txid);
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pending txids in arrival order.
    pub fn txids(&self) -> &[String] {
        self.order.as_slice()
    }

    /// Copy of every pending transaction in arrival order.
    pub fn get_all(&self) -> Vec<Transaction> {
        self.order
            .iter()
            .filter_map(|txid| self.inner.get(txid).cloned())
            .collect()
    }

    /// Sum of pending fees, `None` on overflow.
    pub fn total_fees(&self) -> Option<u64> {
        self.inner
            .values()
            .try_fold(0u64, |acc, tx| acc.checked_add(tx.get_fee()))
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.order.clear();
    }
}
