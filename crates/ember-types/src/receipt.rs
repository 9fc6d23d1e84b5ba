//! Transaction receipt

use bytes::Bytes;
use ember_primitives::{Address, H256};

/// Transaction execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Transaction failed
    Failure = 0,
    /// Transaction succeeded
    Success = 1,
}

impl From<bool> for TxStatus {
    fn from(success: bool) -> Self {
        if success {
            TxStatus::Success
        } else {
            TxStatus::Failure
        }
    }
}

/// Log entry emitted during execution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// Indexed topics
    pub topics: Vec<H256>,
    /// Non-indexed data
    pub data: Bytes,
}

/// Outcome of executing one transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction status (success/failure)
    pub status: TxStatus,
    /// Hash of the executed transaction
    pub tx_hash: H256,
    /// Gas used by this transaction
    pub gas_used: u64,
    /// Logs emitted by this transaction
    pub logs: Vec<Log>,
    /// Contract address created (if contract creation tx)
    pub contract_address: Option<Address>,
}

impl Receipt {
    /// Create a new receipt with no logs
    pub fn new(status: TxStatus, tx_hash: H256, gas_used: u64) -> Self {
        Self {
            status,
            tx_hash,
            gas_used,
            logs: Vec::new(),
            contract_address: None,
        }
    }

    /// Check if transaction succeeded
    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Success
    }
}
