//! Transaction type tags

use crate::error::TxError;
use std::fmt;

/// Transaction type identifier (the EIP-2718 type byte)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (pre-EIP-2718)
    #[default]
    Legacy = 0,
    /// EIP-2930 access list transaction
    AccessList = 1,
    /// EIP-1559 dynamic fee transaction
    DynamicFee = 2,
}

impl TxType {
    /// Type byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Name used in JSON and RPC output
    pub fn name(self) -> &'static str {
        match self {
            TxType::Legacy => "TxTypeLegacyTransaction",
            TxType::AccessList => "TxTypeAccessList",
            TxType::DynamicFee => "TxTypeDynamicFee",
        }
    }

    /// Whether instances of this type are framed with a type byte
    pub fn is_typed(self) -> bool {
        self != TxType::Legacy
    }
}

impl TryFrom<u8> for TxType {
    type Error = TxError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TxType::Legacy),
            1 => Ok(TxType::AccessList),
            2 => Ok(TxType::DynamicFee),
            other => Err(TxError::UnsupportedTxType(other)),
        }
    }
}

impl From<TxType> for u8 {
    fn from(tx_type: TxType) -> Self {
        tx_type as u8
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Account key role a transaction is validated against
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoleType {
    /// Ordinary transaction signing
    Transaction,
    /// Account key updates
    AccountUpdate,
    /// Fee payer signing
    FeePayer,
}
