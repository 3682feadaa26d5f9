pub mod block;
pub mod model;
pub mod shared;
pub mod validation;

pub use block::Block;
pub use model::Blockchain;
pub use shared::SharedBlockchain;
pub use validation::{ChainViolation, ViolationKind};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 2;

/// Amount minted to whoever mines a block.
pub const DEFAULT_MINING_REWARD: u64 = 100;

/// A hex SHA-256 digest has 64 symbols; anything above is unreachable.
pub const MAX_DIFFICULTY: u32 = 64;

/// Nonces tried between checks of a cancellation flag.
pub const MINE_POLL_INTERVAL: u64 = 1024;

/// Genesis block parameters, identical on every instantiation.
pub const GENESIS_TIMESTAMP: i64 = 1_672_531_200; // 2023-01-01T00:00:00Z
pub const GENESIS_PREVIOUS_HASH: &str = "0";
