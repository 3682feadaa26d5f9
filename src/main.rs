use std::env;

use dotenvy::dotenv;
use log::info;

use rust_ledger::{Address, Blockchain, ChainConfig, Transaction, Wallet};

fn main() -> rust_ledger::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = ChainConfig::from_env();
    let wallet = match env::var("LEDGER_PRIVATE_KEY") {
        Ok(hex) => Wallet::from_secret_hex(&hex)?,
        Err(_) => Wallet::generate(),
    };
    let payee = Address::new("public key goes here");

    let (difficulty, reward) = (config.difficulty, config.mining_reward);
    println!("⛓️ Starting ledger (difficulty {difficulty}, reward {reward})");
    println!("Wallet address: {}", wallet.address());

    let mut chain = Blockchain::new(config);
    chain.mine_pending_transactions(wallet.address());

    for _ in 0..2 {
        let mut tx = Transaction::new(wallet.address().clone(), payee.clone(), 10);
        tx.sign(chain.engine(), wallet.secret_key())?;
        chain.add_transaction(tx)?;
        info!("Starting the miner...");
        chain.mine_pending_transactions(wallet.address());
    }

    for (i, block) in chain.blocks().iter().enumerate() {
        println!(
            "#{i} {} prev={} nonce={} txs={}",
            block.hash(),
            block.previous_hash(),
            block.nonce(),
            block.transactions().len()
        );
    }
    println!("Chain valid: {}", chain.is_chain_valid());
    let balance = chain.get_balance_of_address(wallet.address());
    println!("Balance = {balance}");
    Ok(())
}
