//! Keyed-value construction input shared by the transaction family

use crate::access_list::AccessList;
use crate::error::TxBuildError;
use crate::execution::CodeFormat;
use bytes::Bytes;
use ember_primitives::{Address, U256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Field key accepted by keyed-value constructors.
///
/// The key space covers every transaction type; each type consumes the keys
/// it needs and rejects the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxValueKey {
    /// Account nonce (`u64`)
    Nonce,
    /// Recipient (`Address`)
    To,
    /// Transferred value (`U256`)
    Amount,
    /// Gas limit (`u64`)
    GasLimit,
    /// Legacy gas price (`U256`)
    GasPrice,
    /// Payload (`Bytes`)
    Data,
    /// Sender (`Address`)
    From,
    /// Anchor data (`Bytes`)
    Anchor,
    /// Human-readable address flag (`bool`)
    HumanReadable,
    /// Account key
    AccountKey,
    /// Fee payer (`Address`)
    FeePayer,
    /// Fee payer ratio (`u8`)
    FeeRatioOfFeePayer,
    /// Contract code format (`CodeFormat`)
    CodeFormat,
    /// Access list (`AccessList`)
    AccessList,
    /// Chain id (`U256`)
    ChainId,
    /// Max priority fee per gas (`U256`)
    GasTipCap,
    /// Max fee per gas (`U256`)
    GasFeeCap,
}

impl TxValueKey {
    /// Every key, in declaration order
    pub const ALL: [TxValueKey; 17] = [
        TxValueKey::Nonce,
        TxValueKey::To,
        TxValueKey::Amount,
        TxValueKey::GasLimit,
        TxValueKey::GasPrice,
        TxValueKey::Data,
        TxValueKey::From,
        TxValueKey::Anchor,
        TxValueKey::HumanReadable,
        TxValueKey::AccountKey,
        TxValueKey::FeePayer,
        TxValueKey::FeeRatioOfFeePayer,
        TxValueKey::CodeFormat,
        TxValueKey::AccessList,
        TxValueKey::ChainId,
        TxValueKey::GasTipCap,
        TxValueKey::GasFeeCap,
    ];

    /// Short token, as used in request maps
    pub fn token(self) -> &'static str {
        match self {
            TxValueKey::Nonce => "nonce",
            TxValueKey::To => "to",
            TxValueKey::Amount => "amount",
            TxValueKey::GasLimit => "gasLimit",
            TxValueKey::GasPrice => "gasPrice",
            TxValueKey::Data => "data",
            TxValueKey::From => "from",
            TxValueKey::Anchor => "anchor",
            TxValueKey::HumanReadable => "humanReadable",
            TxValueKey::AccountKey => "accountKey",
            TxValueKey::FeePayer => "feePayer",
            TxValueKey::FeeRatioOfFeePayer => "feeRatioOfFeePayer",
            TxValueKey::CodeFormat => "codeFormat",
            TxValueKey::AccessList => "accessList",
            TxValueKey::ChainId => "chainId",
            TxValueKey::GasTipCap => "gasTipCap",
            TxValueKey::GasFeeCap => "gasFeeCap",
        }
    }

    /// Diagnostic name
    pub fn name(self) -> &'static str {
        match self {
            TxValueKey::Nonce => "TxValueKeyNonce",
            TxValueKey::To => "TxValueKeyTo",
            TxValueKey::Amount => "TxValueKeyAmount",
            TxValueKey::GasLimit => "TxValueKeyGasLimit",
            TxValueKey::GasPrice => "TxValueKeyGasPrice",
            TxValueKey::Data => "TxValueKeyData",
            TxValueKey::From => "TxValueKeyFrom",
            TxValueKey::Anchor => "TxValueKeyAnchor",
            TxValueKey::HumanReadable => "TxValueKeyHumanReadable",
            TxValueKey::AccountKey => "TxValueKeyAccountKey",
            TxValueKey::FeePayer => "TxValueKeyFeePayer",
            TxValueKey::FeeRatioOfFeePayer => "TxValueKeyFeeRatioOfFeePayer",
            TxValueKey::CodeFormat => "TxValueKeyCodeFormat",
            TxValueKey::AccessList => "TxValueKeyAccessList",
            TxValueKey::ChainId => "TxValueKeyChainID",
            TxValueKey::GasTipCap => "TxValueKeyGasTipCap",
            TxValueKey::GasFeeCap => "TxValueKeyGasFeeCap",
        }
    }
}

impl fmt::Display for TxValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TxValueKey {
    type Err = TxBuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TxValueKey::ALL
            .iter()
            .copied()
            .find(|k| k.token() == s)
            .ok_or_else(|| TxBuildError::UnknownKey(s.to_string()))
    }
}

/// Dynamically typed value stored under a [`TxValueKey`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxValue {
    /// Unsigned 64-bit integer
    Uint64(u64),
    /// Unsigned 8-bit integer
    Uint8(u8),
    /// Flag
    Bool(bool),
    /// Account address
    Address(Address),
    /// Big integer
    BigInt(U256),
    /// Byte string
    Bytes(Bytes),
    /// Access list
    AccessList(AccessList),
    /// Contract code format
    CodeFormat(CodeFormat),
}

impl From<u64> for TxValue {
    fn from(v: u64) -> Self {
        TxValue::Uint64(v)
    }
}

impl From<u8> for TxValue {
    fn from(v: u8) -> Self {
        TxValue::Uint8(v)
    }
}

impl From<bool> for TxValue {
    fn from(v: bool) -> Self {
        TxValue::Bool(v)
    }
}

impl From<Address> for TxValue {
    fn from(v: Address) -> Self {
        TxValue::Address(v)
    }
}

impl From<U256> for TxValue {
    fn from(v: U256) -> Self {
        TxValue::BigInt(v)
    }
}

impl From<Bytes> for TxValue {
    fn from(v: Bytes) -> Self {
        TxValue::Bytes(v)
    }
}

impl From<Vec<u8>> for TxValue {
    fn from(v: Vec<u8>) -> Self {
        TxValue::Bytes(Bytes::from(v))
    }
}

impl From<AccessList> for TxValue {
    fn from(v: AccessList) -> Self {
        TxValue::AccessList(v)
    }
}

impl From<CodeFormat> for TxValue {
    fn from(v: CodeFormat) -> Self {
        TxValue::CodeFormat(v)
    }
}

/// Keyed construction input. Constructors drain the keys they consume.
pub type TxValues = BTreeMap<TxValueKey, TxValue>;

/// Build a [`TxValues`] map from string tokens.
pub fn parse_tx_values<I, S>(entries: I) -> Result<TxValues, TxBuildError>
where
    I: IntoIterator<Item = (S, TxValue)>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|(token, value)| Ok((token.as_ref().parse::<TxValueKey>()?, value)))
        .collect()
}

/// Remove `key` from `values` if `extract` accepts its value.
///
/// A missing or mistyped value fails with `err` and stays in the map.
pub(crate) fn take_value<T>(
    values: &mut TxValues,
    key: TxValueKey,
    extract: impl FnOnce(&TxValue) -> Option<T>,
    err: TxBuildError,
) -> Result<T, TxBuildError> {
    let value = values.get(&key).and_then(extract).ok_or(err)?;
    values.remove(&key);
    Ok(value)
}
