use thiserror::Error;

use crate::blockchain::ChainViolation;

/// Errors surfaced by transaction signing, submission and chain checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("no signature in this transaction")]
    MissingSignature,

    #[error("signing key does not belong to the sending wallet")]
    WrongSigner,

    #[error("transaction signature does not verify")]
    InvalidSignature,

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: i128 },

    #[error("chain corruption: {0}")]
    ChainCorruption(#[from] ChainViolation),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("ledger lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
