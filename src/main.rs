// This is my main entry point for the ledger CLI application
// Every command opens the ledger from the data directory, does one thing and exits
use clap::Parser;
use log::{error, LevelFilter};
use ramia_ledger::{Command, Config, Ledger, Opt};
use std::process;

fn main() {
    // Info level by default, RUST_LOG still wins when it is set
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    // If something goes wrong, I log the error and exit with code 1
    if let Err(e) = run_command(opt) {
        error!("Error: {e}");
        process::exit(1);
    }
}

// I resolve the configuration first: file, then environment, then --datadir
fn load_config(opt: &Opt) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load(opt.conf.as_deref())?;
    if let Some(dir) = &opt.datadir {
        config = config.with_datadir(dir.clone());
    }
    Ok(config)
}

fn run_command(opt: Opt) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&opt)?;
    let mut ledger = Ledger::open(&config.datadir, config.ledger_config())?;

    match opt.command {
        // Opening already created genesis if the directory was empty
        Command::Init => {
            println!(
                "Ledger ready at {} (height {}, tip {})",
                ledger.data_dir().display(),
                ledger.height(),
                ledger.tip_hash()
            );
        }
        Command::Balance { address } => {
            println!("Balance of {address}: {}", ledger.balance(&address));
        }
        // The transfer only waits in the mempool until someone mines
        Command::Send {
            from,
            to,
            amount,
            fee,
            memo,
        } => {
            let tx = ledger.make_tx(&from, &to, amount, fee, &memo);
            let txid = ledger.add_tx_to_mempool(tx)?;
            println!("Queued transaction {txid}");
        }
        Command::Mine { miner } => {
            let block = ledger.mine_next_block(&miner)?;
            println!(
                "Mined block {} at height {} with {} transactions",
                block.block_hash()?,
                block.get_height(),
                block.get_transactions().len()
            );
        }
        // I print the newest blocks first
        Command::Chain { n } => {
            for block in ledger.blocks().iter().rev().take(n) {
                let header = block.get_header();
                println!("Height: {}", header.get_height());
                println!("Block hash: {}", block.block_hash()?);
                println!("Prev hash: {}", header.get_prev_hash());
                println!("Merkle root: {}", header.get_merkle_root());
                println!("Timestamp: {}", header.get_timestamp());
                println!("Bits: {}  Nonce: {}", header.get_bits(), header.get_nonce());
                for tx in block.get_transactions() {
                    let from = tx.sender().unwrap_or("COINBASE");
                    println!(
                        "- Transaction {} from {from} (fee {})",
                        tx.txid()?,
                        tx.get_fee()
                    );
                    for output in tx.get_vout() {
                        println!(
                            "-- Output value = {}, to = {}",
                            output.get_value(),
                            output.get_to_addr()
                        );
                    }
                }
                println!();
            }
        }
        Command::Mempool { drop } => {
            if let Some(txid) = drop {
                if ledger.mempool_mut().remove(&txid).is_none() {
                    return Err(format!("No pending transaction {txid}").into());
                }
                if config.persist_mempool {
                    ledger.flush_mempool()?;
                }
                println!("Dropped {txid}");
            }
            for txid in ledger.mempool().txids() {
                if let Some(tx) = ledger.mempool().get(txid) {
                    println!("{txid} fee {}", tx.get_fee());
                }
            }
            println!("{} pending", ledger.mempool().len());
        }
        Command::Verify => {
            ledger.verify_chain()?;
            println!("Chain OK: {} blocks, tip {}", ledger.blocks().len(), ledger.tip_hash());
        }
    }
    Ok(())
}
