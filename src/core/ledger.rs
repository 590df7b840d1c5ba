// This is the ledger itself - the single object every caller talks to
// It owns the chain, the balances, the mempool, the current difficulty and
// the issuance policy, and exposes the three entry points the outside world
// uses: add_tx_to_mempool, build_block_template and submit_block
//
// Nothing here locks. Every mutating call takes &mut self, so sharing a
// ledger between threads means wrapping it, see SharedLedger

use crate::core::difficulty::{
    INITIAL_BITS, MAX_BITS, MIN_BITS, RETARGET_WINDOW, TARGET_BLOCK_TIME,
};
use crate::core::monetary::{GENESIS_ADDRESS, GENESIS_ALLOCATION};
use crate::core::state::{apply_block, balance_of};
use crate::core::validation::{
    collected_fees, validate_block, verify_tx_basic, ValidationContext,
};
use crate::core::{
    AllowAll, Authorizer, Balances, Block, DifficultyAdjustment, IssuancePolicy, NetworkMetrics,
    ProofOfWork, Transaction, GENESIS_PREV_HASH,
};
use crate::error::{LedgerError, Rejection, Result};
use crate::storage::{LedgerStore, MemoryPool, BLOCKS_FILE, STATE_FILE};
use crate::utils::{current_timestamp, random_nonce};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A ledger behind the mutual exclusion concurrent callers need.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Parameters a ledger is opened with.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Difficulty of the genesis block and of a fresh ledger
    pub initial_bits: u32,
    /// Seconds one block should take
    pub target_block_time: u64,
    /// Blocks looked back on by the difficulty check
    pub retarget_window: u64,
    pub genesis_address: String,
    pub genesis_amount: u64,
    pub policy: IssuancePolicy,
    /// Keep pending transactions in mempool.json across restarts
    pub persist_mempool: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            initial_bits: INITIAL_BITS,
            target_block_time: TARGET_BLOCK_TIME,
            retarget_window: RETARGET_WINDOW,
            genesis_address: GENESIS_ADDRESS.to_string(),
            genesis_amount: GENESIS_ALLOCATION,
            policy: IssuancePolicy::default(),
            persist_mempool: false,
        }
    }
}

pub struct Ledger {
    store: LedgerStore,
    blocks: Vec<Block>, // index == height, never empty once opened
    tip_hash: String,
    balances: Balances,
    mempool: MemoryPool,
    bits: u32,
    policy: IssuancePolicy,
    authorizer: Box<dyn Authorizer>,
    target_block_time: u64,
    retarget_window: u64,
    persist_mempool: bool,
}

impl Ledger {
    // When I want to open the ledger in `dir`, creating genesis if it is empty
    pub fn open(dir: impl AsRef<Path>, config: LedgerConfig) -> Result<Ledger> {
        Self::open_with_authorizer(dir, config, Box::new(AllowAll))
    }

    pub fn open_with_authorizer(
        dir: impl AsRef<Path>,
        config: LedgerConfig,
        authorizer: Box<dyn Authorizer>,
    ) -> Result<Ledger> {
        let store = LedgerStore::open(dir)?;
        let blocks = store.load_blocks()?;

        let mut ledger = Ledger {
            store,
            blocks: Vec::new(),
            tip_hash: String::new(),
            balances: Balances::new(),
            mempool: MemoryPool::new(),
            bits: config.initial_bits,
            policy: config.policy.clone(),
            authorizer,
            target_block_time: config.target_block_time,
            retarget_window: config.retarget_window,
            persist_mempool: config.persist_mempool,
        };

        if blocks.is_empty() {
            ledger.create_genesis(&config)?;
        } else {
            ledger.restore(blocks)?;
        }

        if ledger.persist_mempool {
            ledger.restore_mempool()?;
        }

        info!(
            "Ledger open at {} (height {}, tip {}, bits {})",
            ledger.store.dir().display(),
            ledger.height(),
            ledger.tip_hash,
            ledger.bits
        );
        Ok(ledger)
    }

    pub fn into_shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    // The genesis coinbase pays the whole initial allocation to one address
    fn create_genesis(&mut self, config: &LedgerConfig) -> Result<()> {
        info!(
            "Creating genesis block for address: {}",
            config.genesis_address
        );
        let coinbase = Transaction::new_coinbase_tx(
            &config.genesis_address,
            config.genesis_amount,
            0,
            "genesis",
        );
        let template = Block::assemble(
            GENESIS_PREV_HASH,
            vec![coinbase],
            current_timestamp()?,
            0,
            self.bits,
        )?;
        let genesis = ProofOfWork::mine(&template)?;

        apply_block(&mut self.balances, &genesis)?;
        self.tip_hash = genesis.block_hash()?;
        self.store.append_block(&genesis)?;
        self.blocks.push(genesis);
        self.store.save_state(&self.balances, self.bits)?;
        Ok(())
    }

    // I rebuild the in-memory chain from blocks.jsonl and always replay it
    // state.json is only a snapshot: if a write failed after a block was
    // appended it is stale, and then the replay wins and the file is rewritten
    fn restore(&mut self, blocks: Vec<Block>) -> Result<()> {
        for (index, block) in blocks.iter().enumerate() {
            if block.get_height() != index as u64 {
                return Err(LedgerError::Corrupt(format!(
                    "block at line {} has height {}",
                    index + 1,
                    block.get_height()
                )));
            }
        }

        let tip = blocks
            .last()
            .ok_or_else(|| LedgerError::Corrupt("no blocks to restore".to_string()))?;
        // the difficulty in force after a block is accepted is the one it was mined at
        let tip_bits = tip.get_header().get_bits();
        if !(MIN_BITS..=MAX_BITS).contains(&tip_bits) {
            return Err(LedgerError::Corrupt(format!("tip block carries difficulty {tip_bits}")));
        }
        self.tip_hash = tip.block_hash()?;
        let replayed = Self::replay_balances(&blocks)?;

        let in_sync = match self.store.load_state()? {
            Some(snapshot) => {
                if !(MIN_BITS..=MAX_BITS).contains(&snapshot.bits) {
                    return Err(LedgerError::Corrupt(format!(
                        "{STATE_FILE} carries difficulty {}",
                        snapshot.bits
                    )));
                }
                let in_sync = snapshot.balances == replayed && snapshot.bits == tip_bits;
                if !in_sync {
                    warn!(
                        "{STATE_FILE} does not match {BLOCKS_FILE}, rebuilding it from {} blocks",
                        blocks.len()
                    );
                }
                in_sync
            }
            None => {
                warn!("No state snapshot found, replaying {} blocks", blocks.len());
                false
            }
        };

        self.balances = replayed;
        self.bits = tip_bits;
        self.blocks = blocks;
        if !in_sync {
            self.store.save_state(&self.balances, self.bits)?;
        }
        Ok(())
    }

    // A stored pending transaction that is already in the chain was mined
    // before mempool.json could be rewritten; queueing it again would spend twice
    fn restore_mempool(&mut self) -> Result<()> {
        let mut mined = HashSet::new();
        for block in &self.blocks {
            mined.extend(block.txids()?);
        }

        let mut dropped = 0;
        for tx in self.store.load_mempool()? {
            let txid = tx.txid()?;
            if mined.contains(&txid) {
                debug!("Dropping stored transaction {txid}, it is already mined");
                dropped += 1;
                continue;
            }
            if let Err(why) = verify_tx_basic(&tx, self.authorizer.as_ref()) {
                warn!("Dropping stored mempool transaction {txid}: {why}");
                dropped += 1;
                continue;
            }
            self.mempool.add(txid, tx);
        }

        if dropped > 0 {
            self.flush_mempool()?;
        }
        debug!("Restored {} pending transactions", self.mempool.len());
        Ok(())
    }

    fn replay_balances(blocks: &[Block]) -> Result<Balances> {
        let mut balances = Balances::new();
        for block in blocks {
            apply_block(&mut balances, block).map_err(|why| {
                LedgerError::Corrupt(format!(
                    "block {} does not apply: {why}",
                    block.get_height()
                ))
            })?;
        }
        Ok(balances)
    }

    pub fn tip(&self) -> &Block {
        // opening always leaves at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn tip_hash(&self) -> &str {
        self.tip_hash.as_str()
    }

    pub fn height(&self) -> u64 {
        self.tip().get_height()
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.as_slice()
    }

    pub fn balance(&self, address: &str) -> u64 {
        balance_of(&self.balances, address)
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    /// Difficulty the next block must carry.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn mempool(&self) -> &MemoryPool {
        &self.mempool
    }

    /// Direct access for wrappers that manage pending transactions
    /// themselves. Call [`Ledger::flush_mempool`] afterwards when mempool
    /// persistence is on.
    pub fn mempool_mut(&mut self) -> &mut MemoryPool {
        &mut self.mempool
    }

    pub fn policy(&self) -> &IssuancePolicy {
        &self.policy
    }

    /// The only way the issuance policy gets trained.
    pub fn policy_mut(&mut self) -> &mut IssuancePolicy {
        &mut self.policy
    }

    pub fn set_authorizer(&mut self, authorizer: Box<dyn Authorizer>) {
        self.authorizer = authorizer;
    }

    pub fn data_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Build a single-input transfer. It is not queued.
    pub fn make_tx(
        &self,
        from: &str,
        to: &str,
        amount: u64,
        fee: u64,
        memo: &str,
    ) -> Transaction {
        Transaction::new_transfer(from, to, amount, fee, memo)
    }

    // Mempool admission only checks structure; whether the sender can pay is
    // decided when the containing block is applied
    pub fn add_tx_to_mempool(&mut self, tx: Transaction) -> Result<String> {
        if let Err(why) = verify_tx_basic(&tx, self.authorizer.as_ref()) {
            debug!("Transaction refused: {why}");
            return Err(why.into());
        }

        let txid = tx.txid()?;
        if !self.mempool.add(txid.clone(), tx) {
            return Err(Rejection::AlreadyInMempool.into());
        }
        info!(
            "Accepted transaction {txid} into mempool ({} pending)",
            self.mempool.len()
        );

        if self.persist_mempool {
            self.flush_mempool()?;
        }
        Ok(txid)
    }

    pub fn flush_mempool(&self) -> Result<()> {
        self.store.save_mempool(&self.mempool.get_all())
    }

    // I assemble the next block from everything pending plus a coinbase that
    // pays the policy subsidy and all fees to the miner
    pub fn build_block_template(&mut self, miner_address: &str) -> Result<Block> {
        self.bits = DifficultyAdjustment::retarget(
            self.bits,
            &self.blocks,
            self.target_block_time,
            self.retarget_window,
        );

        let pending = self.mempool.get_all();
        let fees = self.mempool.total_fees().ok_or(Rejection::AmountOverflow)?;
        let metrics = NetworkMetrics::observe(pending.len(), fees, self.mempool.len());
        let subsidy = self.policy.predict(&metrics);
        let reward = subsidy.checked_add(fees).ok_or(Rejection::AmountOverflow)?;

        let coinbase =
            Transaction::new_coinbase_tx(miner_address, reward, random_nonce(), "coinbase");
        verify_tx_basic(&coinbase, self.authorizer.as_ref())?;

        let mut txs = Vec::with_capacity(pending.len() + 1);
        txs.push(coinbase);
        txs.extend(pending);

        // a block may not be older than its parent
        let timestamp = current_timestamp()?.max(self.tip().get_timestamp());

        info!(
            "Block template at height {} with {} transactions \
             (subsidy {subsidy}, fees {fees}, bits {})",
            self.height() + 1,
            txs.len(),
            self.bits
        );
        Block::assemble(&self.tip_hash, txs, timestamp, self.height() + 1, self.bits)
    }

    // Validate, apply atomically, then persist
    // If writing fails the block stays applied in memory and the error is returned
    pub fn submit_block(&mut self, block: Block) -> Result<()> {
        let ctx = ValidationContext {
            tip: self.tip(),
            tip_hash: &self.tip_hash,
            current_bits: self.bits,
            mempool_size: self.mempool.len(),
            policy: &self.policy,
            authorizer: self.authorizer.as_ref(),
        };
        if let Err(err) = validate_block(&ctx, &block) {
            warn!("Rejected block at height {}: {err}", block.get_height());
            return Err(err);
        }

        if let Err(why) = apply_block(&mut self.balances, &block) {
            warn!("Rejected block at height {}: {why}", block.get_height());
            return Err(why.into());
        }

        let block_hash = block.block_hash()?;
        let included = block.txids()?;
        for txid in included.iter().skip(1) {
            self.mempool.remove(txid);
        }
        let fees = collected_fees(block.get_transactions()).unwrap_or(0);
        self.tip_hash = block_hash.clone();
        self.blocks.push(block);

        info!(
            "Accepted block {} at height {} ({} transactions, fees {fees})",
            block_hash,
            self.height(),
            included.len()
        );

        let tip = self.tip();
        self.store.append_block(tip)?;
        self.store.save_state(&self.balances, self.bits)?;
        if self.persist_mempool {
            self.flush_mempool()?;
        }
        Ok(())
    }

    /// Build a template, mine it and submit it. Returns the accepted block.
    pub fn mine_next_block(&mut self, miner_address: &str) -> Result<Block> {
        let template = self.build_block_template(miner_address)?;
        let mined = ProofOfWork::mine(&template)?;
        self.submit_block(mined.clone())?;
        Ok(mined)
    }

    /// Re-check the stored chain: heights, linkage, merkle roots, each
    /// block's proof of work at its own difficulty, and that replaying every
    /// block reproduces the current balances.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev_hash = GENESIS_PREV_HASH.to_string();
        for (index, block) in self.blocks.iter().enumerate() {
            let header = block.get_header();
            let height = block.get_height();
            let problem = if height != index as u64 {
                Some("has the wrong height")
            } else if header.get_prev_hash() != prev_hash {
                Some("does not link to its parent")
            } else if !block.verify_merkle_root()? {
                Some("has a bad merkle root")
            } else if !ProofOfWork::validate(header)? {
                Some("misses its proof of work")
            } else if !block
                .get_transactions()
                .first()
                .is_some_and(Transaction::is_coinbase)
            {
                Some("has no coinbase")
            } else {
                None
            };
            if let Some(problem) = problem {
                return Err(LedgerError::Corrupt(format!("block {index} {problem}")));
            }
            prev_hash = block.block_hash()?;
        }

        if Self::replay_balances(&self.blocks)? != self.balances {
            return Err(LedgerError::Corrupt(
                "replayed balances differ from the state snapshot".to_string(),
            ));
        }
        Ok(())
    }
}
