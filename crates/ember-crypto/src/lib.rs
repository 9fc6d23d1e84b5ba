//! # ember-crypto
//!
//! Cryptographic primitives for the Ember transaction model.
//!
//! - Keccak-256 hashing
//! - ECDSA signing and public key recovery (secp256k1)
//! - Signature value range checks
//! - Address derivation (account and CREATE addresses)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
mod signature;

pub use address::{create_address, public_key_to_address};
pub use error::CryptoError;
pub use hash::keccak256;
pub use signature::{
    private_key_from_slice, recover_public_key, sign, validate_signature_values, PrivateKey,
    PublicKey, Signature, SECP256K1_HALF_N, SECP256K1_N,
};
