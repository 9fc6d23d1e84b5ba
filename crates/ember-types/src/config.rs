//! Chain configuration and fork rules

use crate::gas::ForkRules;
use serde::{Deserialize, Serialize};

/// Fork flags active at a block height
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rules {
    /// EIP-2028 calldata pricing
    pub is_istanbul: bool,
    /// EIP-1559 fee market
    pub is_london: bool,
    /// EIP-3860 init code metering
    pub is_shanghai: bool,
}

/// Chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    /// Chain ID
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// First Istanbul block (`None` = never)
    #[serde(default)]
    pub istanbul_block: Option<u64>,
    /// First London block (`None` = never)
    #[serde(default)]
    pub london_block: Option<u64>,
    /// First Shanghai block (`None` = never)
    #[serde(default)]
    pub shanghai_block: Option<u64>,
}

fn default_chain_id() -> u64 {
    1337
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            istanbul_block: Some(0),
            london_block: Some(0),
            shanghai_block: Some(0),
        }
    }
}

impl ChainConfig {
    /// Configuration with no forks activated
    pub fn frontier(chain_id: u64) -> Self {
        Self {
            chain_id,
            istanbul_block: None,
            london_block: None,
            shanghai_block: None,
        }
    }
}

fn is_active(fork_block: Option<u64>, block_number: u64) -> bool {
    fork_block.is_some_and(|b| b <= block_number)
}

impl ForkRules for ChainConfig {
    fn rules(&self, block_number: u64) -> Rules {
        Rules {
            is_istanbul: is_active(self.istanbul_block, block_number),
            is_london: is_active(self.london_block, block_number),
            is_shanghai: is_active(self.shanghai_block, block_number),
        }
    }
}
