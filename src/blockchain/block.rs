use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use log::debug;
use serde_json::Value;

use super::{GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP, MINE_POLL_INTERVAL};
use crate::crypto::{SignatureEngine, sha256_hex};
use crate::transaction::Transaction;

/// An ordered batch of transactions sealed by Proof-of-Work.
///
/// Content fields are fixed at construction; only mining moves `nonce`,
/// and `hash` is recomputed with every nonce change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub(crate) timestamp: i64, // Unix millis (UTC)
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) previous_hash: String,
    pub(crate) nonce: u64,
    pub(crate) hash: String, // sealed hash
}

impl Block {
    /// First block of every chain. Not mined.
    pub fn genesis() -> Self {
        Self::with_timestamp(
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            GENESIS_TIMESTAMP,
        )
    }

    /// Create a new block stamped with the current time. Call `mine()` to perform PoW.
    pub fn new(previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self::with_timestamp(previous_hash, transactions, Utc::now().timestamp_millis())
    }

    pub fn with_timestamp(
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Compact JSON array of the canonical transaction objects.
    pub fn transactions_json(&self) -> String {
        let txs = self.transactions.iter().map(Transaction::canonical_json);
        Value::Array(txs.collect()).to_string()
    }

    /// SHA-256 (hex) over `"{previous_hash}:{timestamp}:{transactions_json}:{nonce}"`,
    /// excluding the stored `hash` itself.
    pub fn compute_hash(&self) -> String {
        let preimage = format!(
            "{}:{}:{}:{}",
            self.previous_hash,
            self.timestamp,
            self.transactions_json(),
            self.nonce
        );
        sha256_hex(preimage.as_bytes())
    }

    /// Whether the stored hash starts with `difficulty` hex zeros.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        hash_meets_difficulty(&self.hash, difficulty)
    }

    /// Perform Proof-of-Work: bump the nonce until the hash starts with
    /// `difficulty` zeros. Does nothing if the current hash already does.
    pub fn mine(&mut self, difficulty: u32) {
        self.search(difficulty, None);
    }

    /// Same as `mine`, but gives up once `cancel` is set. The flag is polled
    /// every `MINE_POLL_INTERVAL` nonces. Returns whether the block got sealed.
    pub fn mine_cancellable(&mut self, difficulty: u32, cancel: &AtomicBool) -> bool {
        self.search(difficulty, Some(cancel))
    }

    fn search(&mut self, difficulty: u32, cancel: Option<&AtomicBool>) -> bool {
        let mut tries: u64 = 0;
        while !self.meets_difficulty(difficulty) {
            if tries % MINE_POLL_INTERVAL == 0
                && cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                debug!("mining cancelled after {tries} nonces");
                return false;
            }
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = self.compute_hash();
            tries += 1;
        }
        debug!("block mined: {} (nonce {})", self.hash, self.nonce);
        true
    }

    /// True iff every transaction verifies. An unsigned transfer counts as invalid.
    pub fn has_valid_transactions(&self, engine: &SignatureEngine) -> bool {
        self.first_invalid_transaction(engine).is_none()
    }

    /// Index of the first transaction that does not verify.
    pub fn first_invalid_transaction(&self, engine: &SignatureEngine) -> Option<usize> {
        self.transactions
            .iter()
            .position(|tx| !matches!(tx.is_valid(engine), Ok(true)))
    }
}

pub(crate) fn hash_meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let d = difficulty as usize;
    hash.len() >= d && hash.bytes().take(d).all(|b| b == b'0')
}
