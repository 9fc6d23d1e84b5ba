//! Execution engine and state capabilities consumed by transactions

use bytes::Bytes;
use ember_primitives::{Address, U256};

/// Format of contract code passed to creation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CodeFormat {
    /// EVM bytecode
    #[default]
    Evm = 0,
}

/// Account state mutations a transaction performs directly
pub trait StateDb {
    /// Increment the nonce of `address`
    fn inc_nonce(&mut self, address: &Address);
}

/// Anything that can act as an execution caller
pub trait ContractRef {
    /// Caller address
    fn address(&self) -> Address;
}

impl ContractRef for Address {
    fn address(&self) -> Address {
        *self
    }
}

/// Result of a message call.
///
/// Output and gas used are meaningful even when `error` is set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutput<E> {
    /// Returned data
    pub ret: Bytes,
    /// Gas consumed
    pub used_gas: u64,
    /// Execution error, if any
    pub error: Option<E>,
}

impl<E> ExecutionOutput<E> {
    /// Whether execution finished without error
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of contract creation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateOutput<E> {
    /// Returned data (deployed code on success)
    pub ret: Bytes,
    /// Address of the new contract
    pub contract_address: Address,
    /// Gas consumed
    pub used_gas: u64,
    /// Execution error, if any
    pub error: Option<E>,
}

impl<E> From<CreateOutput<E>> for ExecutionOutput<E> {
    fn from(out: CreateOutput<E>) -> Self {
        ExecutionOutput {
            ret: out.ret,
            used_gas: out.used_gas,
            error: out.error,
        }
    }
}

/// Execution engine
pub trait Vm {
    /// Engine-specific execution error
    type Error;

    /// Create a contract from `code`. Increments the caller's nonce.
    fn create(
        &mut self,
        caller: &dyn ContractRef,
        code: &[u8],
        gas: u64,
        value: U256,
        format: CodeFormat,
    ) -> CreateOutput<Self::Error>;

    /// Call `to` with `input`
    fn call(
        &mut self,
        caller: &dyn ContractRef,
        to: &Address,
        input: &[u8],
        gas: u64,
        value: U256,
    ) -> ExecutionOutput<Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_contract_ref() {
        let addr = Address::from_bytes([0x33; 20]);
        let caller: &dyn ContractRef = &addr;
        assert_eq!(caller.address(), addr);
    }

    #[test]
    fn test_create_output_conversion() {
        let out: ExecutionOutput<String> = CreateOutput {
            ret: Bytes::from_static(&[0x60, 0x00]),
            contract_address: Address::from_bytes([0x44; 20]),
            used_gas: 1234,
            error: Some("reverted".to_string()),
        }
        .into();
        assert_eq!(out.used_gas, 1234);
        assert_eq!(out.ret.len(), 2);
        assert!(!out.is_success());
    }
}
