use crate::core::DEFAULT_TRANSACTION_FEE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ramia-ledger")]
pub struct Opt {
    #[arg(long = "datadir", global = true, help = "Ledger data directory")]
    pub datadir: Option<PathBuf>,
    #[arg(
        long = "conf",
        global = true,
        help = "TOML configuration file (default ./ramia.toml if present)"
    )]
    pub conf: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "init", about = "Create the ledger and its genesis block")]
    Init,
    #[command(name = "balance", about = "Get the balance of an address")]
    Balance {
        #[arg(help = "The account address")]
        address: String,
    },
    #[command(name = "send", about = "Queue a transfer in the mempool")]
    Send {
        #[arg(help = "Paying address")]
        from: String,
        #[arg(help = "Receiving address")]
        to: String,
        #[arg(help = "Amount to send (in base units)")]
        amount: u64,
        #[arg(
            long = "fee",
            default_value_t = DEFAULT_TRANSACTION_FEE,
            help = "Fee paid to the miner"
        )]
        fee: u64,
        #[arg(long = "memo", default_value = "", help = "Free-form note")]
        memo: String,
    },
    #[command(name = "mine", about = "Mine one block with everything pending")]
    Mine {
        #[arg(help = "Address that receives the subsidy and fees")]
        miner: String,
    },
    #[command(name = "chain", about = "Print the most recent blocks")]
    Chain {
        #[arg(long = "n", default_value_t = 20, help = "How many blocks to show")]
        n: usize,
    },
    #[command(name = "mempool", about = "List pending transactions")]
    Mempool {
        #[arg(long = "drop", help = "Remove this txid from the mempool")]
        drop: Option<String>,
    },
    #[command(name = "verify", about = "Re-check the stored chain and state")]
    Verify,
}
