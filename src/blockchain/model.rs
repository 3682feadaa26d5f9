use std::sync::atomic::AtomicBool;

use log::{debug, info, warn};

use super::Block;
use super::validation::{self, ChainViolation};
use crate::config::ChainConfig;
use crate::crypto::SignatureEngine;
use crate::error::{LedgerError, Result};
use crate::transaction::{Sender, Transaction};
use crate::wallet::Address;

/// Simple in-memory blockchain with Proof-of-Work and a pending buffer.
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub(crate) chain: Vec<Block>,
    difficulty: u32,
    pending_transactions: Vec<Transaction>,
    mining_reward: u64,
    engine: SignatureEngine,
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl Blockchain {
    /// Initialize a new blockchain holding only the genesis block.
    pub fn new(config: ChainConfig) -> Self {
        let config = config.clamped();
        Self {
            chain: vec![Block::genesis()],
            difficulty: config.difficulty,
            pending_transactions: Vec::new(),
            mining_reward: config.mining_reward,
            engine: SignatureEngine::new(),
        }
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Never true for a constructed chain; genesis is always present.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.mining_reward
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn engine(&self) -> &SignatureEngine {
        &self.engine
    }

    /// Validate and queue a signed transfer.
    ///
    /// The sender must be able to cover this amount plus everything it
    /// already has pending, out of its committed balance.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        let from = match tx.from() {
            Sender::Wallet(addr) if !addr.is_empty() => addr.clone(),
            _ => {
                warn!("rejected tx {}: missing sender", tx.hash());
                return Err(LedgerError::InvalidAddress(
                    "transactions must include from and to address".into(),
                ));
            }
        };
        if tx.to().is_empty() {
            warn!("rejected tx {}: missing recipient", tx.hash());
            return Err(LedgerError::InvalidAddress(
                "transactions must include from and to address".into(),
            ));
        }

        if !tx.is_valid(&self.engine)? {
            warn!("rejected tx {}: signature does not verify", tx.hash());
            return Err(LedgerError::InvalidSignature);
        }

        let balance = self.get_balance_of_address(&from);
        let amount = u128::from(tx.amount());
        if i128::from(tx.amount()) > balance {
            warn!(
                "rejected tx {}: balance {} < {}",
                tx.hash(),
                balance,
                amount
            );
            return Err(LedgerError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        let pending = self.pending_debits(&from);
        let total = pending + amount;
        if total as i128 > balance {
            warn!(
                "rejected tx {}: pending {} + {} exceeds balance {}",
                tx.hash(),
                pending,
                amount,
                balance
            );
            return Err(LedgerError::InsufficientBalance {
                required: total,
                available: balance,
            });
        }

        debug!(
            "queued tx {} ({} -> {}, {}); pending now {}",
            tx.hash(),
            from,
            tx.to(),
            amount,
            self.pending_transactions.len() + 1
        );
        self.pending_transactions.push(tx);
        Ok(())
    }

    /// Package every pending transaction plus a reward for `reward_address`
    /// into a block, mine it, and append it.
    pub fn mine_pending_transactions(&mut self, reward_address: &Address) -> &Block {
        let mut block = self.next_block(reward_address);
        block.mine(self.difficulty);
        self.commit(block)
    }

    /// Like `mine_pending_transactions`, but stops when `cancel` is set.
    /// A cancelled run leaves both the chain and the pending buffer untouched.
    pub fn mine_pending_transactions_cancellable(
        &mut self,
        reward_address: &Address,
        cancel: &AtomicBool,
    ) -> Option<&Block> {
        let mut block = self.next_block(reward_address);
        if !block.mine_cancellable(self.difficulty, cancel) {
            info!(
                "mining cancelled; {} txs stay pending",
                self.pending_transactions.len()
            );
            return None;
        }
        Some(self.commit(block))
    }

    fn next_block(&self, reward_address: &Address) -> Block {
        if reward_address.is_empty() {
            warn!("mining reward paid to an empty address");
        }
        let mut txs = Vec::with_capacity(self.pending_transactions.len() + 1);
        txs.extend(self.pending_transactions.iter().cloned());
        let reward = Transaction::reward(reward_address.clone(), self.mining_reward);
        txs.push(reward);
        Block::new(self.last_block().hash().to_string(), txs)
    }

    fn commit(&mut self, block: Block) -> &Block {
        info!(
            "block #{} mined: {} ({} txs, nonce {})",
            self.chain.len(),
            block.hash(),
            block.transactions().len(),
            block.nonce()
        );
        self.chain.push(block);
        self.pending_transactions.clear();
        self.last_block()
    }

    /// Committed balance: credits minus debits over every mined block.
    /// Starts at zero; rewards never debit anyone.
    pub fn get_balance_of_address(&self, address: &Address) -> i128 {
        let mut balance: i128 = 0;
        for block in &self.chain {
            for tx in block.transactions() {
                if tx.from().address() == Some(address) {
                    balance -= i128::from(tx.amount());
                }
                if tx.to() == address {
                    balance += i128::from(tx.amount());
                }
            }
        }
        balance
    }

    /// What `address` can still send: committed balance minus its pending debits.
    pub fn pending_balance_of_address(&self, address: &Address) -> i128 {
        self.get_balance_of_address(address) - self.pending_debits(address) as i128
    }

    fn pending_debits(&self, address: &Address) -> u128 {
        self.pending_transactions
            .iter()
            .filter(|tx| tx.from().address() == Some(address))
            .map(|tx| u128::from(tx.amount()))
            .sum()
    }

    /// Re-verify the whole chain and report the first failing block.
    pub fn validate_chain(&self) -> std::result::Result<(), ChainViolation> {
        let verdict = validation::scan(&self.chain, self.difficulty, &self.engine);
        if let Err(violation) = &verdict {
            warn!("chain validation failed: {violation}");
        }
        verdict
    }

    /// Validate the entire chain: genesis, transactions, hashes, linkage and PoW.
    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    /// `validate_chain` as a `LedgerError::ChainCorruption`.
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate_chain()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ViolationKind;
    use crate::wallet::Wallet;

    fn low_difficulty() -> Blockchain {
        Blockchain::new(ChainConfig {
            difficulty: 1,
            mining_reward: 100,
        })
    }

    fn transfer(bc: &Blockchain, from: &Wallet, to: &Address, amount: u64) -> Transaction {
        let mut tx = Transaction::new(from.address().clone(), to.clone(), amount);
        tx.sign(bc.engine(), from.secret_key()).unwrap();
        tx
    }

    fn short(required: u128, available: i128) -> LedgerError {
        LedgerError::InsufficientBalance {
            required,
            available,
        }
    }

    fn is_invalid_address(result: Result<()>) -> bool {
        matches!(result, Err(LedgerError::InvalidAddress(_)))
    }

    #[test]
    fn starts_with_genesis_only() {
        let bc = Blockchain::default();
        assert_eq!(bc.len(), 1);
        assert!(!bc.is_empty());
        assert_eq!(bc.difficulty(), 2);
        assert_eq!(bc.mining_reward(), 100);
        assert_eq!(bc.last_block(), &Block::genesis());
        assert!(bc.is_chain_valid());
    }

    #[test]
    fn transfer_needs_funds_then_settles() {
        let mut bc = Blockchain::default();
        let a = Wallet::generate();
        let b = Wallet::generate();

        let tx = transfer(&bc, &a, b.address(), 10);
        assert_eq!(bc.add_transaction(tx.clone()), Err(short(10, 0)));

        bc.mine_pending_transactions(a.address());
        assert_eq!(bc.get_balance_of_address(a.address()), 100);

        bc.add_transaction(tx).unwrap();
        bc.mine_pending_transactions(a.address());
        assert_eq!(bc.get_balance_of_address(a.address()), 190);
        assert_eq!(bc.get_balance_of_address(b.address()), 10);
        assert!(bc.is_chain_valid());
    }

    #[test]
    fn mining_credits_reward_and_clears_pending() {
        let mut bc = low_difficulty();
        let a = Wallet::generate();
        let miner = Wallet::generate();
        bc.mine_pending_transactions(a.address());

        let tx = transfer(&bc, &a, miner.address(), 30);
        bc.add_transaction(tx).unwrap();
        assert_eq!(bc.pending_transactions().len(), 1);

        let before = bc.get_balance_of_address(miner.address());
        let block = bc.mine_pending_transactions(miner.address());
        assert!(block.hash().starts_with('0'));
        let last = block.transactions().last().unwrap();
        assert!(last.is_reward());

        let after = bc.get_balance_of_address(miner.address());
        assert_eq!(after, before + 100 + 30);
        assert!(bc.pending_transactions().is_empty());
    }

    #[test]
    fn pending_spend_is_counted_and_boundary_accepted() {
        let mut bc = low_difficulty();
        let a = Wallet::generate();
        let b = Address::new("bob");
        bc.mine_pending_transactions(a.address());

        bc.add_transaction(transfer(&bc, &a, &b, 60)).unwrap();
        assert_eq!(bc.pending_balance_of_address(a.address()), 40);

        let over = transfer(&bc, &a, &b, 41);
        assert_eq!(bc.add_transaction(over), Err(short(101, 100)));
        // exactly the remaining balance
        bc.add_transaction(transfer(&bc, &a, &b, 40)).unwrap();
        assert_eq!(bc.pending_balance_of_address(a.address()), 0);
        assert_eq!(bc.pending_transactions().len(), 2);
    }

    #[test]
    fn rejects_missing_addresses() {
        let mut bc = low_difficulty();
        let a = Wallet::generate();

        let mint = Transaction::reward(a.address().clone(), 5);
        assert!(is_invalid_address(bc.add_transaction(mint)));

        let no_to = Transaction::new(a.address().clone(), Address::new(""), 5);
        assert!(is_invalid_address(bc.add_transaction(no_to)));

        let no_from = Transaction::new(Address::new(""), Address::new("bob"), 5);
        assert!(is_invalid_address(bc.add_transaction(no_from)));
    }

    #[test]
    fn rejects_unsigned_and_forged() {
        let mut bc = low_difficulty();
        let a = Wallet::generate();
        bc.mine_pending_transactions(a.address());

        let unsigned = Transaction::new(a.address().clone(), Address::new("bob"), 5);
        assert_eq!(
            bc.add_transaction(unsigned),
            Err(LedgerError::MissingSignature)
        );

        let mut forged = transfer(&bc, &a, &Address::new("bob"), 5);
        forged.amount = 50;
        assert_eq!(
            bc.add_transaction(forged),
            Err(LedgerError::InvalidSignature)
        );
        assert!(bc.pending_transactions().is_empty());
    }

    fn mined_chain() -> (Blockchain, Wallet) {
        let mut bc = low_difficulty();
        let a = Wallet::generate();
        bc.mine_pending_transactions(a.address());
        let tx = transfer(&bc, &a, &Address::new("bob"), 10);
        bc.add_transaction(tx).unwrap();
        bc.mine_pending_transactions(a.address());
        (bc, a)
    }

    #[test]
    fn tampered_amount_breaks_chain() {
        let (mut bc, _) = mined_chain();
        assert!(bc.is_chain_valid());
        bc.chain[2].transactions[0].amount = 1;
        assert_eq!(
            bc.validate_chain(),
            Err(ChainViolation {
                index: 2,
                kind: ViolationKind::InvalidTransaction { tx_index: 0 }
            })
        );
        assert!(!bc.is_chain_valid());
    }

    #[test]
    fn tampered_reward_amount_is_hash_mismatch() {
        let (mut bc, _) = mined_chain();
        bc.chain[1].transactions[0].amount = 1_000_000;
        assert_eq!(
            bc.validate_chain().map_err(|v| v.kind),
            Err(ViolationKind::HashMismatch)
        );
    }

    #[test]
    fn tampered_hash_breaks_chain() {
        let (mut bc, _) = mined_chain();
        bc.chain[1].hash = "00deadbeef".into();
        let v = bc.validate_chain().unwrap_err();
        assert_eq!(v.index, 1);
        assert_eq!(v.kind, ViolationKind::HashMismatch);
    }

    #[test]
    fn tampered_link_breaks_chain() {
        let (mut bc, _) = mined_chain();
        bc.chain[2].previous_hash = "0".into();
        assert!(!bc.is_chain_valid());
        let v = bc.validate_chain().unwrap_err();
        assert_eq!(v.index, 2);
        assert_eq!(bc.ensure_valid(), Err(LedgerError::ChainCorruption(v)));
    }

    #[test]
    fn resealed_link_tamper_still_caught() {
        let (mut bc, _) = mined_chain();
        let block = &mut bc.chain[2];
        block.previous_hash = "0".into();
        block.nonce = 0;
        block.hash = block.compute_hash();
        block.mine(1);
        assert_eq!(
            bc.validate_chain().map_err(|v| v.kind),
            Err(ViolationKind::BrokenLink)
        );
    }

    #[test]
    fn cancelled_mining_keeps_pending() {
        let mut bc = Blockchain::new(ChainConfig {
            difficulty: 64,
            mining_reward: 100,
        });
        let miner = Address::new("miner");
        let cancel = AtomicBool::new(true);
        let mined = bc.mine_pending_transactions_cancellable(&miner, &cancel);
        assert!(mined.is_none());
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.get_balance_of_address(&miner), 0);
    }

    #[test]
    fn cancellable_mining_completes_when_not_cancelled() {
        let mut bc = low_difficulty();
        let miner = Address::new("miner");
        let cancel = AtomicBool::new(false);
        let mined = bc.mine_pending_transactions_cancellable(&miner, &cancel);
        let hash = mined.map(|b| b.hash().to_string());
        assert_eq!(hash.as_deref(), Some(bc.last_block().hash()));
        assert_eq!(bc.get_balance_of_address(&miner), 100);
    }

    #[test]
    fn difficulty_is_clamped() {
        let bc = Blockchain::new(ChainConfig {
            difficulty: 500,
            mining_reward: 1,
        });
        assert_eq!(bc.difficulty(), crate::blockchain::MAX_DIFFICULTY);
    }
}
