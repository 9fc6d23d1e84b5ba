//! Transaction signature values and sender recovery

use crate::error::{TxError, TxResult};
use ember_crypto::{
    public_key_to_address, recover_public_key, validate_signature_values, PublicKey, Signature,
};
use ember_primitives::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Signature triple as carried by a transaction.
///
/// The zero triple is the placeholder every encoder emits for an unsigned
/// transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxSignature {
    /// Recovery component
    #[serde(with = "crate::hexutil::big", alias = "V")]
    pub v: U256,
    /// R component
    #[serde(with = "crate::hexutil::big", alias = "R")]
    pub r: U256,
    /// S component
    #[serde(with = "crate::hexutil::big", alias = "S")]
    pub s: U256,
}

/// Signatures attached to one transaction
pub type TxSignatures = Vec<TxSignature>;

impl TxSignature {
    /// Create a new signature
    pub fn new(v: U256, r: U256, s: U256) -> Self {
        Self { v, r, s }
    }

    /// Whether this is the all-zero placeholder
    pub fn is_placeholder(&self) -> bool {
        self.v.is_zero() && self.r.is_zero() && self.s.is_zero()
    }
}

/// Recover the signing public key from raw signature values.
///
/// `v` is the already-adjusted recovery value (27 or 28 for a valid
/// signature). `homestead` additionally requires a low `s`.
pub fn recover_plain_pubkey(
    sig_hash: &H256,
    r: &U256,
    s: &U256,
    v: &U256,
    homestead: bool,
) -> TxResult<PublicKey> {
    if v.bits() > 8 {
        return Err(TxError::InvalidSignature);
    }
    let v = (v.low_u64() as u8).wrapping_sub(27);
    if !validate_signature_values(v, r, s, homestead) {
        return Err(TxError::InvalidSignature);
    }
    let signature = Signature::from_values(v, r, s);
    Ok(recover_public_key(sig_hash, &signature)?)
}

/// Recover the signer address from raw signature values.
pub fn recover_plain(
    sig_hash: &H256,
    r: &U256,
    s: &U256,
    v: &U256,
    homestead: bool,
) -> TxResult<Address> {
    let public_key = recover_plain_pubkey(sig_hash, r, s, v, homestead)?;
    Ok(public_key_to_address(&public_key))
}

/// Chain id implied by a signature's `v` value.
///
/// `27`/`28` carry no chain id; otherwise `v = chain_id * 2 + 35 + {0, 1}`.
pub fn derive_chain_id(v: &U256) -> U256 {
    if v.bits() <= 64 {
        let v = v.low_u64();
        if v == 27 || v == 28 {
            return U256::zero();
        }
        return U256::from(v.wrapping_sub(35) / 2);
    }
    (*v - U256::from(35u64)) / U256::from(2u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_crypto::{keccak256, sign, SECP256K1_HALF_N};
    use rand::rngs::OsRng;

    // ==================== derive_chain_id ====================

    #[test]
    fn test_derive_chain_id_unprotected() {
        assert_eq!(derive_chain_id(&U256::from(27u64)), U256::zero());
        assert_eq!(derive_chain_id(&U256::from(28u64)), U256::zero());
    }

    #[test]
    fn test_derive_chain_id_eip155() {
        // chain 1: v = 37 / 38
        assert_eq!(derive_chain_id(&U256::from(37u64)), U256::one());
        assert_eq!(derive_chain_id(&U256::from(38u64)), U256::one());
        // chain 8217: v = 8217 * 2 + 35
        assert_eq!(derive_chain_id(&U256::from(16469u64)), U256::from(8217u64));
    }

    #[test]
    fn test_derive_chain_id_wraps_small_v() {
        // u64 wrapping subtraction, then halved
        let expected = U256::from(0u64.wrapping_sub(35) / 2);
        assert_eq!(derive_chain_id(&U256::zero()), expected);
    }

    #[test]
    fn test_derive_chain_id_wide_v() {
        let v = U256::from(u64::MAX) * U256::from(4u64) + U256::from(35u64);
        assert_eq!(derive_chain_id(&v), U256::from(u64::MAX) * U256::from(2u64));
    }

    // ==================== recover_plain ====================

    fn signed() -> (H256, ember_crypto::PrivateKey, Signature) {
        let key = ember_crypto::PrivateKey::random(&mut OsRng);
        let hash = keccak256(b"recover plain");
        let sig = sign(&hash, &key).unwrap();
        (hash, key, sig)
    }

    #[test]
    fn test_recover_plain_roundtrip() {
        let (hash, key, sig) = signed();
        let v = U256::from(sig.v as u64 + 27);
        let address = recover_plain(&hash, &sig.r_value(), &sig.s_value(), &v, true).unwrap();
        assert_eq!(address, public_key_to_address(key.verifying_key()));
    }

    #[test]
    fn test_recover_plain_rejects_wide_v() {
        let (hash, _, sig) = signed();
        let v = U256::from(27u64 + 256);
        assert!(matches!(
            recover_plain(&hash, &sig.r_value(), &sig.s_value(), &v, true),
            Err(TxError::InvalidSignature)
        ));
    }

    #[test]
    fn test_recover_plain_rejects_unadjusted_v() {
        // v of 0/1 wraps below 27 and fails the range check
        let (hash, _, sig) = signed();
        let v = U256::from(sig.v as u64);
        assert!(matches!(
            recover_plain(&hash, &sig.r_value(), &sig.s_value(), &v, true),
            Err(TxError::InvalidSignature)
        ));
    }

    #[test]
    fn test_recover_plain_homestead_rejects_high_s() {
        let (hash, _, sig) = signed();
        let high_s = SECP256K1_HALF_N + U256::one();
        assert!(matches!(
            recover_plain(&hash, &sig.r_value(), &high_s, &U256::from(27u64), true),
            Err(TxError::InvalidSignature)
        ));
    }

    #[test]
    fn test_recover_plain_pubkey_matches_key() {
        let (hash, key, sig) = signed();
        let v = U256::from(sig.v as u64 + 27);
        let public_key =
            recover_plain_pubkey(&hash, &sig.r_value(), &sig.s_value(), &v, false).unwrap();
        assert_eq!(&public_key, key.verifying_key());
    }

    // ==================== TxSignature ====================

    #[test]
    fn test_placeholder() {
        assert!(TxSignature::default().is_placeholder());
        assert!(!TxSignature::new(U256::one(), U256::zero(), U256::zero()).is_placeholder());
    }

    #[test]
    fn test_signature_json_accepts_upper_case() {
        let sig: TxSignature =
            serde_json::from_str(r#"{"V":"0x1","R":"0xa","S":"0xb"}"#).unwrap();
        assert_eq!(sig, TxSignature::new(1u64.into(), 10u64.into(), 11u64.into()));

        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, r#"{"v":"0x1","r":"0xa","s":"0xb"}"#);
    }

    #[test]
    fn test_signature_json_requires_all_fields() {
        assert!(serde_json::from_str::<TxSignature>(r#"{"v":"0x1","r":"0xa"}"#).is_err());
    }
}
