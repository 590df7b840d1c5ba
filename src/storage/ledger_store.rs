// On-disk layout of a ledger data directory:
//   blocks.jsonl  append-only, one JSON block per line
//   state.json    balances + current bits, rewritten after every block
//   mempool.json  pending transactions, only when mempool persistence is on
//
// state.json and mempool.json are replaced with write-to-temp + rename so a
// crash leaves either the old or the new file, never a torn one.

use crate::core::{Balances, Block, Transaction};
use crate::error::{LedgerError, Result};
use crate::utils::deserialize;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub const BLOCKS_FILE: &str = "blocks.jsonl";
pub const STATE_FILE: &str = "state.json";
pub const MEMPOOL_FILE: &str = "mempool.json";

/// Contents of `state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub balances: Balances,
    pub bits: u32,
}

#[derive(Serialize)]
struct StateRef<'a> {
    balances: &'a Balances,
    bits: u32,
}

pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    /// Use `dir` as the data directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<LedgerStore> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(LedgerStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Every stored block in file order. Blank lines are skipped.
    pub fn load_blocks(&self) -> Result<Vec<Block>> {
        let path = self.path(BLOCKS_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut blocks = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let block: Block = serde_json::from_str(&line).map_err(|e| {
                LedgerError::Corrupt(format!("{BLOCKS_FILE} line {}: {e}", lineno + 1))
            })?;
            blocks.push(block);
        }
        debug!("Loaded {} blocks from {}", blocks.len(), path.display());
        Ok(blocks)
    }

    /// Append one block as a single line and flush it to disk.
    pub fn append_block(&self, block: &Block) -> Result<()> {
        let mut line = serde_json::to_string(block)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path(BLOCKS_FILE))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;
        Ok(())
    }

    pub fn load_state(&self) -> Result<Option<StateSnapshot>> {
        let path = self.path(STATE_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)?;
        let snapshot = deserialize(&raw)
            .map_err(|e| LedgerError::Corrupt(format!("{STATE_FILE}: {e}")))?;
        Ok(Some(snapshot))
    }

    pub fn save_state(&self, balances: &Balances, bits: u32) -> Result<()> {
        let json = serde_json::to_string_pretty(&StateRef { balances, bits })?;
        self.write_atomic(STATE_FILE, json.as_bytes())
    }

    pub fn load_mempool(&self) -> Result<Vec<Transaction>> {
        let path = self.path(MEMPOOL_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read(&path)?;
        deserialize(&raw).map_err(|e| LedgerError::Corrupt(format!("{MEMPOOL_FILE}: {e}")))
    }

    pub fn save_mempool(&self, txs: &[Transaction]) -> Result<()> {
        let json = serde_json::to_string_pretty(txs)?;
        self.write_atomic(MEMPOOL_FILE, json.as_bytes())
    }

    fn write_atomic(&self, file: &str, bytes: &[u8]) -> Result<()> {
        let target = self.path(file);
        let tmp = self.path(&format!("{file}.tmp"));
        {
            let mut f = File::create(&tmp)?;
            f.write_all(bytes)?;
            f.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GENESIS_PREV_HASH;
    use tempfile::tempdir;

    fn block(height: u64) -> Block {
        let coinbase = Transaction::new_coinbase_tx("miner", 10 + height, height, "coinbase");
        Block::assemble(GENESIS_PREV_HASH, vec![coinbase], 1_700_000_000 + height, height, 1)
            .unwrap()
    }

    #[test]
    fn test_blocks_round_trip_in_order() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path().join("data")).unwrap();
        assert!(store.load_blocks().unwrap().is_empty());

        for height in 0..3 {
            store.append_block(&block(height)).unwrap();
        }
        let loaded = store.load_blocks().unwrap();
        assert_eq!(loaded, vec![block(0), block(1), block(2)]);

        let raw = fs::read_to_string(dir.path().join("data").join(BLOCKS_FILE)).unwrap();
        assert_eq!(raw.lines().count(), 3);
    }

    #[test]
    fn test_state_is_replaced_atomically() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        assert!(store.load_state().unwrap().is_none());

        let mut balances = Balances::new();
        balances.insert("zed".to_string(), 1);
        balances.insert("amy".to_string(), 2);
        store.save_state(&balances, 5).unwrap();
        balances.insert("amy".to_string(), 3);
        store.save_state(&balances, 6).unwrap();

        let snapshot = store.load_state().unwrap().unwrap();
        assert_eq!(snapshot.balances, balances);
        assert_eq!(snapshot.bits, 6);
        assert!(!dir.path().join("state.json.tmp").exists());

        let raw = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(raw.find("\"amy\"").unwrap() < raw.find("\"zed\"").unwrap());
    }

    #[test]
    fn test_corrupt_block_line_is_reported() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        store.append_block(&block(0)).unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(BLOCKS_FILE))
            .unwrap();
        writeln!(file, "{{\"header\": 1}}").unwrap();

        match store.load_blocks() {
            Err(LedgerError::Corrupt(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }

    #[test]
    fn test_mempool_file() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        assert!(store.load_mempool().unwrap().is_empty());

        let txs = vec![
            Transaction::new_transfer("a", "b", 1, 1, "first"),
            Transaction::new_transfer("a", "c", 2, 1, "second"),
        ];
        store.save_mempool(&txs).unwrap();
        assert_eq!(store.load_mempool().unwrap(), txs);
    }
}
