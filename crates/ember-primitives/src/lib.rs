//! # ember-primitives
//!
//! Fixed-size value types shared by the Ember transaction crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod hash;

pub use address::{Address, AddressError, PRECOMPILED_CONTRACT_ADDRESSES};
pub use hash::{HashError, H256};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Big-endian 32-byte encoding of a `U256`.
pub fn u256_to_be_bytes(value: &U256) -> [u8; 32] {
    let mut out = [0u8; 32];
    value.to_big_endian(&mut out);
    out
}
