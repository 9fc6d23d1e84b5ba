//! `0x`-prefixed hex encoding for JSON quantities and byte strings.
//!
//! Quantities are encoded as minimal hex (`0x0` for zero). Decoding is
//! strict: the prefix is required, digits must be present, leading zeros
//! are rejected and values must fit the target width.

use ember_primitives::U256;
use thiserror::Error;

/// Hex decoding error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    /// String does not start with `0x`
    #[error("hex string without 0x prefix")]
    MissingPrefix,
    /// `0x` with no digits
    #[error("hex string \"0x\"")]
    EmptyNumber,
    /// Quantity with a leading zero digit
    #[error("hex number with leading zero digits")]
    LeadingZero,
    /// Quantity wider than 64 bits
    #[error("hex number > 64 bits")]
    Uint64Range,
    /// Quantity wider than 256 bits
    #[error("hex number > 256 bits")]
    BigRange,
    /// Byte string with an odd number of digits
    #[error("hex string of odd length")]
    OddLength,
    /// Non-hex character
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
}

/// Encode a big quantity
pub fn encode_big(value: &U256) -> String {
    format!("0x{:x}", value)
}

/// Encode a u64 quantity
pub fn encode_uint64(value: u64) -> String {
    format!("0x{:x}", value)
}

/// Encode a byte string
pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_prefix(s: &str) -> Result<&str, HexError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(HexError::MissingPrefix)
}

fn quantity_digits(s: &str) -> Result<&str, HexError> {
    let digits = strip_prefix(s)?;
    if digits.is_empty() {
        return Err(HexError::EmptyNumber);
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(HexError::LeadingZero);
    }
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidHex(format!("invalid character {:?}", c)));
    }
    Ok(digits)
}

/// Decode a big quantity
pub fn decode_big(s: &str) -> Result<U256, HexError> {
    let digits = quantity_digits(s)?;
    if digits.len() > 64 {
        return Err(HexError::BigRange);
    }
    U256::from_str_radix(digits, 16).map_err(|e| HexError::InvalidHex(format!("{:?}", e)))
}

/// Decode a u64 quantity
pub fn decode_uint64(s: &str) -> Result<u64, HexError> {
    let digits = quantity_digits(s)?;
    if digits.len() > 16 {
        return Err(HexError::Uint64Range);
    }
    u64::from_str_radix(digits, 16).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Decode a byte string
pub fn decode_bytes(s: &str) -> Result<Vec<u8>, HexError> {
    let digits = strip_prefix(s)?;
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    hex::decode(digits).map_err(|e| HexError::InvalidHex(e.to_string()))
}

/// Serde adapter for `U256` quantities
pub mod big {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as a hex quantity
    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_big(value))
    }

    /// Deserialize from a hex quantity
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_big(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter for optional `U256` quantities (`null` when absent)
pub mod opt_big {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as a hex quantity or `null`
    pub fn serialize<S: Serializer>(
        value: &Option<U256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&encode_big(v)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from a hex quantity or `null`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<U256>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| decode_big(&s).map_err(de::Error::custom))
            .transpose()
    }
}

/// Serde adapter for `u64` quantities
pub mod uint64 {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as a hex quantity
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_uint64(*value))
    }

    /// Deserialize from a hex quantity
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_uint64(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter for byte strings
pub mod bytes {
    use super::*;
    use ::bytes::Bytes;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as `0x`-prefixed hex
    pub fn serialize<S: Serializer>(value: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_bytes(value))
    }

    /// Deserialize from `0x`-prefixed hex
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_bytes(&s).map(Bytes::from).map_err(de::Error::custom)
    }
}
