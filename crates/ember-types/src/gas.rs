//! Intrinsic gas

use crate::access_list::AccessList;
use crate::config::Rules;
use crate::error::{TxError, TxResult};

/// Transaction gas parameters
pub mod params {
    /// Base transaction gas
    pub const TX_GAS: u64 = 21000;
    /// Base contract creation gas
    pub const TX_GAS_CONTRACT_CREATION: u64 = 53000;
    /// Payload zero byte
    pub const TX_DATA_ZERO_GAS: u64 = 4;
    /// Payload non-zero byte before Istanbul
    pub const TX_DATA_NON_ZERO_GAS_FRONTIER: u64 = 68;
    /// Payload non-zero byte from Istanbul (EIP-2028)
    pub const TX_DATA_NON_ZERO_GAS_EIP2028: u64 = 16;
    /// Access list address
    pub const TX_ACCESS_LIST_ADDRESS_GAS: u64 = 2400;
    /// Access list storage key
    pub const TX_ACCESS_LIST_STORAGE_KEY_GAS: u64 = 1900;
    /// Init code word (EIP-3860)
    pub const INIT_CODE_WORD_GAS: u64 = 2;
    /// Max contract code size
    pub const MAX_CODE_SIZE: usize = 24576;
    /// Max init code size (EIP-3860)
    pub const MAX_INIT_CODE_SIZE: usize = 2 * MAX_CODE_SIZE;
}

/// Resolves the fork rules active at a block height
pub trait ForkRules {
    /// Rules at `block_number`
    fn rules(&self, block_number: u64) -> Rules;
}

impl ForkRules for Rules {
    fn rules(&self, _block_number: u64) -> Rules {
        *self
    }
}

fn add(gas: u64, cost: u64) -> TxResult<u64> {
    gas.checked_add(cost).ok_or(TxError::GasUintOverflow)
}

fn mul(count: u64, cost: u64) -> TxResult<u64> {
    count.checked_mul(cost).ok_or(TxError::GasUintOverflow)
}

/// Gas charged before execution starts
pub fn intrinsic_gas(
    data: &[u8],
    access_list: &AccessList,
    contract_creation: bool,
    rules: &Rules,
) -> TxResult<u64> {
    let mut gas = if contract_creation {
        params::TX_GAS_CONTRACT_CREATION
    } else {
        params::TX_GAS
    };

    if !data.is_empty() {
        let non_zero = data.iter().filter(|b| **b != 0).count() as u64;
        let zero = data.len() as u64 - non_zero;

        let non_zero_gas = if rules.is_istanbul {
            params::TX_DATA_NON_ZERO_GAS_EIP2028
        } else {
            params::TX_DATA_NON_ZERO_GAS_FRONTIER
        };
        gas = add(gas, mul(non_zero, non_zero_gas)?)?;
        gas = add(gas, mul(zero, params::TX_DATA_ZERO_GAS)?)?;

        if contract_creation && rules.is_shanghai {
            if data.len() > params::MAX_INIT_CODE_SIZE {
                return Err(TxError::MaxInitCodeSizeExceeded {
                    size: data.len(),
                    limit: params::MAX_INIT_CODE_SIZE,
                });
            }
            let words = (data.len() as u64).div_ceil(32);
            gas = add(gas, mul(words, params::INIT_CODE_WORD_GAS)?)?;
        }
    }

    gas = add(
        gas,
        mul(access_list.len() as u64, params::TX_ACCESS_LIST_ADDRESS_GAS)?,
    )?;
    gas = add(
        gas,
        mul(
            access_list.storage_keys() as u64,
            params::TX_ACCESS_LIST_STORAGE_KEY_GAS,
        )?,
    )?;

    Ok(gas)
}
