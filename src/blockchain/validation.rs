use thiserror::Error;

use super::block::Block;
use crate::crypto::SignatureEngine;

/// Why a committed block failed re-verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    #[error("genesis block was altered")]
    BadGenesis,

    #[error("transaction #{tx_index} does not verify")]
    InvalidTransaction { tx_index: usize },

    #[error("stored hash does not match block content")]
    HashMismatch,

    #[error("previous hash does not match predecessor")]
    BrokenLink,

    #[error("hash does not meet difficulty")]
    InsufficientWork,
}

/// First failing block found by a chain scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block #{index}: {kind}")]
pub struct ChainViolation {
    pub index: usize,
    pub kind: ViolationKind,
}

pub(crate) fn check_genesis(genesis: &Block) -> Result<(), ViolationKind> {
    if genesis != &Block::genesis() {
        return Err(ViolationKind::BadGenesis);
    }
    Ok(())
}

/// Re-verify `block` against its predecessor. Every check runs; the first
/// failure in the order transactions, hash, link, work is reported.
pub(crate) fn check_block(
    block: &Block,
    previous: &Block,
    difficulty: u32,
    engine: &SignatureEngine,
) -> Result<(), ViolationKind> {
    let bad_tx = block.first_invalid_transaction(engine);
    let hash_ok = block.hash == block.compute_hash();
    let link_ok = block.previous_hash == previous.hash;
    let work_ok = block.meets_difficulty(difficulty);

    if let Some(tx_index) = bad_tx {
        return Err(ViolationKind::InvalidTransaction { tx_index });
    }
    if !hash_ok {
        return Err(ViolationKind::HashMismatch);
    }
    if !link_ok {
        return Err(ViolationKind::BrokenLink);
    }
    if !work_ok {
        return Err(ViolationKind::InsufficientWork);
    }
    Ok(())
}

/// Scan a whole block sequence, genesis first.
pub(crate) fn scan(
    blocks: &[Block],
    difficulty: u32,
    engine: &SignatureEngine,
) -> Result<(), ChainViolation> {
    let Some(genesis) = blocks.first() else {
        return Err(ChainViolation {
            index: 0,
            kind: ViolationKind::BadGenesis,
        });
    };
    if let Err(kind) = check_genesis(genesis) {
        return Err(ChainViolation { index: 0, kind });
    }

    for (index, pair) in blocks.windows(2).enumerate() {
        let (previous, block) = (&pair[0], &pair[1]);
        if let Err(kind) = check_block(block, previous, difficulty, engine) {
            return Err(ChainViolation {
                index: index + 1,
                kind,
            });
        }
    }
    Ok(())
}
