use std::sync::{Arc, Mutex, MutexGuard};

use super::Blockchain;
use crate::error::{LedgerError, Result};
use crate::transaction::Transaction;
use crate::wallet::Address;

/// A blockchain behind a single mutex, for callers on several threads.
///
/// Balance checks and mining both read then write the pending buffer and the
/// block list, so every operation runs under the same lock.
#[derive(Debug, Clone, Default)]
pub struct SharedBlockchain {
    inner: Arc<Mutex<Blockchain>>,
}

impl SharedBlockchain {
    pub fn new(blockchain: Blockchain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(blockchain)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Blockchain>> {
        self.inner.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<()> {
        self.lock()?.add_transaction(tx)
    }

    /// Mine pending transactions; returns the new block's hash.
    pub fn mine_pending_transactions(&self, reward_address: &Address) -> Result<String> {
        let mut bc = self.lock()?;
        let block = bc.mine_pending_transactions(reward_address);
        Ok(block.hash().to_string())
    }

    pub fn balance_of(&self, address: &Address) -> Result<i128> {
        Ok(self.lock()?.get_balance_of_address(address))
    }

    pub fn pending_len(&self) -> Result<usize> {
        Ok(self.lock()?.pending_transactions().len())
    }

    pub fn is_chain_valid(&self) -> Result<bool> {
        Ok(self.lock()?.is_chain_valid())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Run `f` with exclusive access to the chain.
    pub fn with<T>(&self, f: impl FnOnce(&mut Blockchain) -> T) -> Result<T> {
        Ok(f(&mut *self.lock()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::wallet::Wallet;
    use std::thread;

    fn signed_payment(bc: &Blockchain, from: &Wallet, to: &str) -> Transaction {
        let mut tx = Transaction::new(from.address().clone(), Address::new(to), 60);
        tx.sign(bc.engine(), from.secret_key()).unwrap();
        tx
    }

    #[test]
    fn concurrent_spends_cannot_overdraw() {
        let config = ChainConfig {
            difficulty: 1,
            mining_reward: 100,
        };
        let shared = SharedBlockchain::new(Blockchain::new(config));
        let alice = Arc::new(Wallet::generate());
        shared.mine_pending_transactions(alice.address()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                let alice = Arc::clone(&alice);
                thread::spawn(move || {
                    let payee = format!("payee-{i}");
                    let tx = shared.with(|bc| signed_payment(bc, &alice, &payee));
                    shared.add_transaction(tx.unwrap()).is_ok()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(shared.pending_len().unwrap(), 1);

        shared.mine_pending_transactions(alice.address()).unwrap();
        assert_eq!(shared.balance_of(alice.address()).unwrap(), 140);
        assert_eq!(shared.len().unwrap(), 3);
        assert!(shared.is_chain_valid().unwrap());
    }
}
