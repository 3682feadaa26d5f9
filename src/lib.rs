//! Single-node educational ledger: signed transfers, hash-linked blocks
//! sealed by Proof-of-Work, and whole-chain re-verification.

pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use blockchain::{Block, Blockchain, ChainViolation, SharedBlockchain, ViolationKind};
pub use config::ChainConfig;
pub use crypto::SignatureEngine;
pub use error::{LedgerError, Result};
pub use transaction::{Sender, Transaction};
pub use wallet::{Address, Wallet};
