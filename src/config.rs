use std::env;

use log::warn;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, MAX_DIFFICULTY};

/// Tunables recognized by a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    /// Leading hex zeros a block hash needs.
    pub difficulty: u32,
    /// Amount credited to the miner of each block.
    pub mining_reward: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}

impl ChainConfig {
    /// Read `LEDGER_DIFFICULTY` and `LEDGER_MINING_REWARD` from the environment,
    /// falling back to defaults for missing or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let difficulty = lookup("LEDGER_DIFFICULTY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.difficulty);
        let mining_reward = lookup("LEDGER_MINING_REWARD")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.mining_reward);

        let config = Self {
            difficulty,
            mining_reward,
        };
        config.clamped()
    }

    /// Cap difficulty at the digest length so mining can terminate.
    pub fn clamped(self) -> Self {
        if self.difficulty > MAX_DIFFICULTY {
            let requested = self.difficulty;
            warn!("difficulty {requested} exceeds {MAX_DIFFICULTY}, clamping");
            return Self {
                difficulty: MAX_DIFFICULTY,
                ..self
            };
        }
        self
    }
}
