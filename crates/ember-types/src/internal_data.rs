//! Interface implemented by every transaction type's field container

use crate::access_list::AccessList;
use crate::error::TxResult;
use crate::execution::{ContractRef, ExecutionOutput, StateDb, Vm};
use crate::gas::ForkRules;
use crate::receipt::Receipt;
use crate::signature::TxSignatures;
use crate::tx_type::{RoleType, TxType};
use ember_crypto::{create_address, PublicKey};
use ember_primitives::{Address, H256, U256};
use rlp::RlpStream;
use serde_json::{Map, Value};

/// Field container of one transaction type
pub trait TxInternalData {
    /// Transaction type
    fn tx_type(&self) -> TxType;

    /// Account key role used to validate the signature
    fn role_type(&self) -> RoleType;

    /// Account nonce
    fn nonce(&self) -> u64;

    /// Price per gas the sender commits to
    fn price(&self) -> U256;

    /// Gas limit
    fn gas_limit(&self) -> u64;

    /// Recipient, `None` for contract creation
    fn recipient(&self) -> Option<&Address>;

    /// Transferred value
    fn amount(&self) -> U256;

    /// Call input or init code
    fn payload(&self) -> &[u8];

    /// Access list (empty for types without one)
    fn access_list(&self) -> &AccessList;

    /// Cached identity hash
    fn hash(&self) -> Option<H256>;

    /// Set the cached identity hash
    fn set_hash(&mut self, hash: Option<H256>);

    /// Attach signatures
    fn set_signature(&mut self, signatures: TxSignatures);

    /// Attached signatures, or the zero placeholder
    fn raw_signature_values(&self) -> TxSignatures;

    /// Range-check the attached signature
    fn validate_signature(&self) -> bool;

    /// Recover the sender from a precomputed signing hash
    fn recover_address<F>(&self, sig_hash: &H256, homestead: bool, vfunc: F) -> TxResult<Address>
    where
        F: Fn(&U256) -> U256;

    /// Recover the signing public keys from a precomputed signing hash
    fn recover_pubkey<F>(
        &self,
        sig_hash: &H256,
        homestead: bool,
        vfunc: F,
    ) -> TxResult<Vec<PublicKey>>
    where
        F: Fn(&U256) -> U256;

    /// Gas charged before execution at `block_number`
    fn intrinsic_gas<R: ForkRules + ?Sized>(&self, block_number: u64, rules: &R)
        -> TxResult<u64>;

    /// Effective chain id
    fn chain_id(&self) -> U256;

    /// Append the signing payload fields to an open list
    fn serialize_for_sign(&self, stream: &mut RlpStream);

    /// Type-tagged hash over every field including the raw signature
    fn sender_tx_hash(&self) -> H256;

    /// Full static validation
    fn validate<S: StateDb + ?Sized>(&self, state: &S, block_number: u64) -> TxResult<()>;

    /// Validation of the parts that depend on mutable state
    fn validate_mutable_value<S: StateDb + ?Sized>(
        &self,
        state: &S,
        block_number: u64,
    ) -> TxResult<()>;

    /// Whether this is a legacy transaction
    fn is_legacy_transaction(&self) -> bool;

    /// Dispatch to the execution engine
    fn execute<V, S>(
        &self,
        sender: &dyn ContractRef,
        vm: &mut V,
        state: &mut S,
        block_number: u64,
        gas: u64,
        value: U256,
    ) -> ExecutionOutput<V::Error>
    where
        V: Vm + ?Sized,
        S: StateDb + ?Sized;

    /// RPC projection
    fn make_rpc_output(&self) -> Map<String, Value>;
}

/// Set the receipt's contract address when `tx` is a contract creation.
pub fn fill_contract_address<T: TxInternalData>(tx: &T, from: &Address, receipt: &mut Receipt) {
    if tx.recipient().is_none() {
        receipt.contract_address = Some(create_address(from, tx.nonce()));
    }
}
