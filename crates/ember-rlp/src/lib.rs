//! # ember-rlp
//!
//! RLP (Recursive Length Prefix) helpers for the Ember transaction model.
//!
//! Wraps the `rlp` crate and adds the two framings typed transactions need:
//!
//! - Nullable fields: an absent value is the empty string `0x80`, not an
//!   empty list (the `rlp` crate encodes `Option<T>` as a list).
//! - Typed envelopes (EIP-2718): `type_byte || rlp(payload)`.

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytes::{BufMut, BytesMut};
use std::cmp::Ordering;
use thiserror::Error;

// Re-export rlp crate for direct use
pub use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

// Re-export primitives with RLP support
pub use ember_primitives::{Address, H256};

/// Smallest first byte of an RLP list. A typed envelope's type byte must be below it.
pub const RLP_LIST_OFFSET: u8 = 0xc0;

/// Typed envelope framing error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// No bytes at all
    #[error("empty typed transaction bytes")]
    Empty,
    /// First byte is an RLP list prefix, so there is no type byte
    #[error("not a typed envelope: leading byte {0:#04x}")]
    Untyped(u8),
}

/// Encode a value to RLP bytes
pub fn encode<T: Encodable>(value: &T) -> Vec<u8> {
    rlp::encode(value).to_vec()
}

/// Decode RLP bytes to a value.
///
/// `data` must hold exactly one item; trailing bytes are rejected.
pub fn decode<T: Decodable>(data: &[u8]) -> Result<T, DecoderError> {
    let rlp = Rlp::new(data);
    let info = rlp.payload_info()?;
    match (info.header_len + info.value_len).cmp(&data.len()) {
        Ordering::Less => Err(DecoderError::RlpIsTooBig),
        Ordering::Greater => Err(DecoderError::RlpIsTooShort),
        Ordering::Equal => rlp.as_val(),
    }
}

/// Append an optional value; `None` becomes the empty string.
pub fn append_nullable<T: Encodable>(stream: &mut RlpStream, value: Option<&T>) {
    match value {
        Some(v) => {
            stream.append(v);
        }
        None => {
            stream.append_empty_data();
        }
    }
}

/// Decode a value written by [`append_nullable`].
pub fn decode_nullable<T: Decodable>(rlp: &Rlp) -> Result<Option<T>, DecoderError> {
    if rlp.is_data() && rlp.is_empty() {
        return Ok(None);
    }
    rlp.as_val().map(Some)
}

/// Item count of a list whose items exactly fill its payload.
fn checked_item_count(rlp: &Rlp) -> Result<usize, DecoderError> {
    if !rlp.is_list() {
        return Err(DecoderError::RlpExpectedToBeList);
    }
    let count = rlp.item_count()?;
    let mut consumed = 0;
    for index in 0..count {
        consumed += rlp.at(index)?.as_raw().len();
    }
    // Unparseable bytes end item iteration early
    if consumed != rlp.payload_info()?.value_len {
        return Err(DecoderError::RlpInconsistentLengthAndData);
    }
    Ok(count)
}

/// Fail unless `rlp` is a list of exactly `expected` items.
pub fn expect_list_len(rlp: &Rlp, expected: usize) -> Result<(), DecoderError> {
    if checked_item_count(rlp)? != expected {
        return Err(DecoderError::RlpIncorrectListLen);
    }
    Ok(())
}

/// Decode a list of values. An empty string is not an empty list.
pub fn decode_list<T: Decodable>(rlp: &Rlp) -> Result<Vec<T>, DecoderError> {
    let count = checked_item_count(rlp)?;
    (0..count).map(|index| rlp.val_at(index)).collect()
}

/// Frame an RLP payload as `type_byte || payload`.
pub fn encode_typed(type_byte: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(1 + payload.len());
    buf.put_u8(type_byte);
    buf.put_slice(payload);
    buf.to_vec()
}

/// Split a typed envelope into its type byte and RLP payload.
pub fn split_typed(data: &[u8]) -> Result<(u8, &[u8]), EnvelopeError> {
    match data.split_first() {
        None => Err(EnvelopeError::Empty),
        Some((&first, _)) if first >= RLP_LIST_OFFSET => Err(EnvelopeError::Untyped(first)),
        Some((&first, rest)) => Ok((first, rest)),
    }
}
