//! EIP-2930 access list

use ember_primitives::{Address, H256};
use ember_rlp::{decode_list, expect_list_len};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access list entry: an address and the storage keys it touches
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTuple {
    /// Account address
    pub address: Address,
    /// Storage keys
    pub storage_keys: Vec<H256>,
}

impl AccessTuple {
    /// Create a new entry
    pub fn new(address: Address, storage_keys: Vec<H256>) -> Self {
        Self {
            address,
            storage_keys,
        }
    }
}

impl Encodable for AccessTuple {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(2);
        s.append(&self.address);
        s.append_list(&self.storage_keys);
    }
}

impl Decodable for AccessTuple {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        expect_list_len(rlp, 2)?;
        Ok(Self {
            address: rlp.val_at(0)?,
            storage_keys: decode_list(&rlp.at(1)?)?,
        })
    }
}

/// Ordered access list. Order is significant for equality and encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessList(pub Vec<AccessTuple>);

impl AccessList {
    /// Create from entries
    pub fn new(entries: Vec<AccessTuple>) -> Self {
        AccessList(entries)
    }

    /// Number of addresses
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of storage keys across all entries
    pub fn storage_keys(&self) -> usize {
        self.0.iter().map(|t| t.storage_keys.len()).sum()
    }

    /// Iterate over entries
    pub fn iter(&self) -> std::slice::Iter<'_, AccessTuple> {
        self.0.iter()
    }
}

impl From<Vec<AccessTuple>> for AccessList {
    fn from(entries: Vec<AccessTuple>) -> Self {
        AccessList(entries)
    }
}

impl Encodable for AccessList {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.append_list(&self.0);
    }
}

impl Decodable for AccessList {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        Ok(AccessList(decode_list(rlp)?))
    }
}

impl fmt::Display for AccessList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, tuple) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{{{:x} [", tuple.address)?;
            for (j, key) in tuple.storage_keys.iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", hex::encode(key.as_bytes()))?;
            }
            write!(f, "]}}")?;
        }
        write!(f, "]")
    }
}
