//! Signer for typed transactions from London on

use crate::error::{TxError, TxResult};
use crate::internal_data::TxInternalData;
use crate::signature::TxSignature;
use ember_crypto::{keccak256, sign, PrivateKey, PublicKey, Signature};
use ember_primitives::{Address, H256, U256};
use ember_rlp::encode_typed;
use rlp::RlpStream;

/// Signs and recovers dynamic-fee and access-list transactions for one chain.
///
/// The signing hash is `keccak256(type || rlp([chain_id, ..signing payload]))`
/// and the attached `v` is the bare recovery id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LondonSigner {
    chain_id: U256,
}

/// Latest signer for `chain_id`
pub fn latest_signer_for_chain_id(chain_id: U256) -> LondonSigner {
    LondonSigner::new(chain_id)
}

fn recovery_v(v: &U256) -> U256 {
    v.saturating_add(U256::from(27u64))
}

impl LondonSigner {
    /// Create a signer for `chain_id`
    pub fn new(chain_id: U256) -> Self {
        Self { chain_id }
    }

    /// Chain id this signer signs for
    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }

    /// Hash the transaction is signed over
    pub fn hash<T: TxInternalData>(&self, tx: &T) -> H256 {
        let mut stream = RlpStream::new();
        stream.begin_unbounded_list();
        stream.append(&self.chain_id);
        tx.serialize_for_sign(&mut stream);
        stream.finalize_unbounded_list();
        keccak256(&encode_typed(tx.tx_type().as_u8(), &stream.out()))
    }

    fn check_chain_id<T: TxInternalData>(&self, tx: &T) -> TxResult<()> {
        let have = tx.chain_id();
        if have != self.chain_id {
            return Err(TxError::InvalidChainId {
                have,
                want: self.chain_id,
            });
        }
        Ok(())
    }

    /// Recover the sender address
    pub fn sender<T: TxInternalData>(&self, tx: &T) -> TxResult<Address> {
        self.check_chain_id(tx)?;
        tx.recover_address(&self.hash(tx), true, recovery_v)
    }

    /// Recover the sender public keys
    pub fn sender_pubkey<T: TxInternalData>(&self, tx: &T) -> TxResult<Vec<PublicKey>> {
        self.check_chain_id(tx)?;
        tx.recover_pubkey(&self.hash(tx), true, recovery_v)
    }

    /// Convert a raw signature into the values attached to `tx`
    pub fn signature_values<T: TxInternalData>(
        &self,
        tx: &T,
        signature: &Signature,
    ) -> TxResult<TxSignature> {
        let have = tx.chain_id();
        if !have.is_zero() && have != self.chain_id {
            return Err(TxError::InvalidChainId {
                have,
                want: self.chain_id,
            });
        }
        Ok(TxSignature::new(
            U256::from(signature.v),
            signature.r_value(),
            signature.s_value(),
        ))
    }

    /// Sign `tx` with `key` and attach the signature
    pub fn sign_tx<T: TxInternalData>(&self, tx: &mut T, key: &PrivateKey) -> TxResult<()> {
        let hash = self.hash(tx);
        let signature = sign(&hash, key)?;
        let values = self.signature_values(tx, &signature)?;
        tx.set_signature(vec![values]);
        Ok(())
    }
}
