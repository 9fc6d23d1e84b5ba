//! Address derivation

use crate::{keccak256, PublicKey};
use ember_primitives::Address;
use rlp::RlpStream;

/// Derive the account address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // Uncompressed point: 0x04 || x || y
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    address_from_hash_tail(hash.as_bytes())
}

/// Address of a contract created by `sender` at `nonce`:
/// last 20 bytes of `keccak256(rlp([sender, nonce]))`.
pub fn create_address(sender: &Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(sender);
    stream.append(&nonce);
    let hash = keccak256(&stream.out());
    address_from_hash_tail(hash.as_bytes())
}

fn address_from_hash_tail(hash: &[u8; 32]) -> Address {
    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr_bytes)
}
