//! 20-byte account address and the reserved precompiled-contract range

use std::fmt;
use thiserror::Error;

/// Address parsing error
#[derive(Debug, Error)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Low-order values of the addresses reserved for precompiled contracts.
///
/// `0x01..=0x09` are the Ethereum precompiles; `0x03fd`, `0x03fe` and `0x03ff`
/// are the node-specific ones (vmLog, feePayer, validateSender).
pub const PRECOMPILED_CONTRACT_ADDRESSES: [u64; 12] = [
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x03fd, 0x03fe, 0x03ff,
];

/// 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 20;

    /// Zero address (0x0000...0000)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        if slice.len() != Self::LEN {
            return Err(AddressError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Address whose last eight bytes hold `value` big-endian
    pub fn from_low_u64_be(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Address(bytes)
    }

    /// Parse address from hex string (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Get as byte slice
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Whether this address is reserved for a precompiled contract.
    pub fn is_precompiled_contract(&self) -> bool {
        if self.0[..12].iter().any(|b| *b != 0) {
            return false;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[12..]);
        PRECOMPILED_CONTRACT_ADDRESSES.contains(&u64::from_be_bytes(low))
    }

    /// Convert to hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// RLP implementation (behind feature flag)
#[cfg(feature = "rlp")]
mod rlp_impl {
    use super::*;
    use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

    impl Encodable for Address {
        fn rlp_append(&self, s: &mut RlpStream) {
            s.encoder().encode_value(&self.0);
        }
    }

    impl Decodable for Address {
        fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
            rlp.decoder().decode_value(|bytes| {
                Address::from_slice(bytes).map_err(|_| DecoderError::RlpInvalidLength)
            })
        }
    }
}

// Serde implementation: `0x`-prefixed hex strings (behind feature flag)
#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            if !s.starts_with("0x") && !s.starts_with("0X") {
                return Err(de::Error::custom("address must be 0x-prefixed"));
            }
            Address::from_hex(&s[2..]).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Basic functionality tests ====================

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert!(!addr.is_zero());

        let addr2 = Address::from_hex("742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_address_display_is_lowercase() {
        let addr = Address::from_hex("0x742D35CC6634C0532925A3B844BC9E7595F0AB3D").unwrap();
        assert_eq!(
            format!("{}", addr),
            "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d"
        );
        assert_eq!(
            format!("{:x}", addr),
            "742d35cc6634c0532925a3b844bc9e7595f0ab3d"
        );
    }

    #[test]
    fn test_address_from_hex_rejects_bad_input() {
        assert!(matches!(
            Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aGGG"),
            Err(AddressError::InvalidHex(_))
        ));
        assert!(matches!(Address::from_hex("0x"), Err(AddressError::InvalidLength(0))));
        assert!(matches!(
            Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d00"),
            Err(AddressError::InvalidLength(21))
        ));
    }

    #[test]
    fn test_address_from_low_u64_be() {
        let addr = Address::from_low_u64_be(0x03ff);
        assert_eq!(addr.to_hex(), "0x00000000000000000000000000000000000003ff");
    }

    // ==================== Precompiled address tests ====================

    #[test]
    fn test_precompiled_addresses() {
        for low in PRECOMPILED_CONTRACT_ADDRESSES {
            assert!(
                Address::from_low_u64_be(low).is_precompiled_contract(),
                "0x{:x} should be reserved",
                low
            );
        }
    }

    #[test]
    fn test_non_precompiled_addresses() {
        assert!(!Address::ZERO.is_precompiled_contract());
        assert!(!Address::from_low_u64_be(0x0a).is_precompiled_contract());
        assert!(!Address::from_low_u64_be(0x03fc).is_precompiled_contract());
        assert!(!Address::from_low_u64_be(0x0400).is_precompiled_contract());

        // Same low bytes, but a non-zero high byte
        let mut bytes = [0u8; 20];
        bytes[0] = 0x01;
        bytes[19] = 0x01;
        assert!(!Address::from_bytes(bytes).is_precompiled_contract());
    }

    // ==================== Ordering and hashing ====================

    #[test]
    fn test_address_hash_consistency() {
        use std::collections::HashSet;

        let addr1 = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let addr2 = Address::from_hex("0x742d35cc6634c0532925a3b844bc9e7595f0ab3d").unwrap();

        let mut set = HashSet::new();
        set.insert(addr1);
        assert!(set.contains(&addr2));
    }

    #[test]
    fn test_address_ordering_is_bytewise() {
        assert!(Address::from_low_u64_be(1) < Address::from_low_u64_be(2));
        assert!(Address::ZERO < Address::from_bytes([0xff; 20]));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_address_serde_roundtrip() {
        let addr = Address::from_bytes([0x42; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x4242424242424242424242424242424242424242\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);

        assert!(serde_json::from_str::<Address>("\"4242424242424242424242424242424242424242\"").is_err());
    }

    #[cfg(feature = "rlp")]
    #[test]
    fn test_address_rlp_rejects_wrong_length() {
        let encoded = rlp::encode(&vec![0x42u8; 19]);
        assert!(rlp::decode::<Address>(&encoded).is_err());

        let addr = Address::from_bytes([0x42; 20]);
        assert_eq!(rlp::decode::<Address>(&rlp::encode(&addr)).unwrap(), addr);
    }
}
