//! # ember-types
//!
//! Typed transaction data model for Ember.
//!
//! This crate provides:
//! - [`DynamicFeeTx`](dynamic_fee::DynamicFeeTx) - EIP-1559 transaction fields
//! - [`Transaction`](transaction::Transaction) - Typed envelope with cached hash and sender
//! - [`LondonSigner`](signer::LondonSigner) - Signing and sender recovery
//! - [`AccessList`](access_list::AccessList) - EIP-2930 access lists

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access_list;
pub mod config;
pub mod dynamic_fee;
pub mod error;
pub mod execution;
pub mod gas;
pub mod hexutil;
pub mod internal_data;
pub mod receipt;
pub mod signature;
pub mod signer;
pub mod transaction;
pub mod tx_type;
pub mod value_key;

// Re-export commonly used types
pub use access_list::{AccessList, AccessTuple};
pub use config::{ChainConfig, Rules};
pub use dynamic_fee::{DynamicFeeTx, DynamicFeeTxBuilder};
pub use error::{TxBuildError, TxError, TxResult};
pub use execution::{CodeFormat, ContractRef, CreateOutput, ExecutionOutput, StateDb, Vm};
pub use gas::{intrinsic_gas, ForkRules};
pub use internal_data::{fill_contract_address, TxInternalData};
pub use receipt::{Log, Receipt, TxStatus};
pub use signature::{derive_chain_id, recover_plain, TxSignature, TxSignatures};
pub use signer::{latest_signer_for_chain_id, LondonSigner};
pub use transaction::{Transaction, TxData};
pub use tx_type::{RoleType, TxType};
pub use value_key::{parse_tx_values, TxValue, TxValueKey, TxValues};
