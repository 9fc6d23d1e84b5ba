//! Transaction error types

use crate::value_key::TxValueKey;
use ember_crypto::CryptoError;
use ember_primitives::U256;
use ember_rlp::{DecoderError, EnvelopeError};
use thiserror::Error;

/// Error building a transaction from keyed values or a builder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxBuildError {
    /// Nonce missing or not a u64
    #[error("nonce must be a uint64 value")]
    NonceMustBeUint64,

    /// Recipient missing or not an address
    #[error("to must be an address")]
    ToMustBeAddress,

    /// Amount missing or not a big integer
    #[error("amount must be a big integer")]
    AmountMustBeBigInt,

    /// Data missing or not bytes
    #[error("data must be a byte slice")]
    DataMustBeBytes,

    /// Gas limit missing or not a u64
    #[error("gas limit must be a uint64 value")]
    GasLimitMustBeUint64,

    /// Fee cap missing or not a big integer
    #[error("gas fee cap must be a big integer")]
    GasFeeCapMustBeBigInt,

    /// Tip cap missing or not a big integer
    #[error("gas tip cap must be a big integer")]
    GasTipCapMustBeBigInt,

    /// Access list missing or of the wrong type
    #[error("access list must be an access list")]
    AccessListInvalid,

    /// Chain id missing or not a big integer
    #[error("chain id must be a big integer")]
    ChainIdInvalid,

    /// Keys left over after all required keys were consumed
    #[error("undefined key remains: {}", format_keys(.0))]
    UndefinedKeyRemains(Vec<TxValueKey>),

    /// A key token that names no known key
    #[error("unknown value key: {0}")]
    UnknownKey(String),
}

fn format_keys(keys: &[TxValueKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Transaction validation, signing and decoding error
#[derive(Debug, Error)]
pub enum TxError {
    /// Signature values out of range or unrecoverable
    #[error("invalid transaction v, r, s values")]
    InvalidSignature,

    /// Transaction chain id does not match the signer's
    #[error("invalid chain id for signer: have {have}, want {want}")]
    InvalidChainId {
        /// Chain id carried by the transaction
        have: U256,
        /// Chain id of the signer
        want: U256,
    },

    /// Recipient is a reserved precompiled contract address
    #[error("precompiled contract address is not allowed to be used as a recipient")]
    PrecompiledContractAddress,

    /// Intrinsic gas does not fit in a u64
    #[error("gas uint64 overflow")]
    GasUintOverflow,

    /// Creation payload larger than the init code limit
    #[error("max initcode size exceeded: code size {size} limit {limit}")]
    MaxInitCodeSizeExceeded {
        /// Payload size
        size: usize,
        /// Allowed size
        limit: usize,
    },

    /// Type byte names no supported transaction type
    #[error("transaction type not supported: {0}")]
    UnsupportedTxType(u8),

    /// Typed envelope with no bytes
    #[error("typed transaction too short")]
    EmptyTypedTransaction,

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// RLP decoding error
    #[error("rlp error: {0}")]
    Rlp(#[from] DecoderError),
}

impl From<EnvelopeError> for TxError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Empty => TxError::EmptyTypedTransaction,
            EnvelopeError::Untyped(byte) => TxError::UnsupportedTxType(byte),
        }
    }
}

/// Result type for transaction operations
pub type TxResult<T> = Result<T, TxError>;
