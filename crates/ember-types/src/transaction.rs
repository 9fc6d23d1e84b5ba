//! Typed transaction envelope

use crate::access_list::AccessList;
use crate::dynamic_fee::DynamicFeeTx;
use crate::error::{TxError, TxResult};
use crate::execution::{ContractRef, ExecutionOutput, StateDb, Vm};
use crate::gas::ForkRules;
use crate::internal_data::{fill_contract_address, TxInternalData};
use crate::receipt::Receipt;
use crate::signature::TxSignatures;
use crate::signer::LondonSigner;
use crate::tx_type::{RoleType, TxType};
use ember_crypto::{PrivateKey, PublicKey};
use ember_primitives::{Address, H256, U256};
use ember_rlp::{decode, split_typed};
use rlp::RlpStream;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use tracing::trace;

/// Field container of any supported transaction type
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxData {
    /// EIP-1559 dynamic fee transaction
    DynamicFee(DynamicFeeTx),
}

macro_rules! delegate {
    ($self:ident, $tx:ident => $body:expr) => {
        match $self {
            TxData::DynamicFee($tx) => $body,
        }
    };
}

impl TxData {
    /// Decode the RLP payload of a typed envelope
    pub fn decode_typed(type_byte: u8, payload: &[u8]) -> TxResult<Self> {
        match TxType::try_from(type_byte)? {
            TxType::DynamicFee => Ok(TxData::DynamicFee(decode(payload)?)),
            other => Err(TxError::UnsupportedTxType(other.as_u8())),
        }
    }

    /// Typed envelope bytes
    pub fn encode_typed(&self) -> Vec<u8> {
        delegate!(self, tx => tx.encode_typed())
    }

    /// Identity hash over the typed envelope
    pub fn tx_hash(&self) -> H256 {
        delegate!(self, tx => tx.tx_hash())
    }
}

impl From<DynamicFeeTx> for TxData {
    fn from(tx: DynamicFeeTx) -> Self {
        TxData::DynamicFee(tx)
    }
}

impl TxInternalData for TxData {
    fn tx_type(&self) -> TxType {
        delegate!(self, tx => tx.tx_type())
    }

    fn role_type(&self) -> RoleType {
        delegate!(self, tx => tx.role_type())
    }

    fn nonce(&self) -> u64 {
        delegate!(self, tx => tx.nonce())
    }

    fn price(&self) -> U256 {
        delegate!(self, tx => tx.price())
    }

    fn gas_limit(&self) -> u64 {
        delegate!(self, tx => TxInternalData::gas_limit(tx))
    }

    fn recipient(&self) -> Option<&Address> {
        delegate!(self, tx => tx.recipient())
    }

    fn amount(&self) -> U256 {
        delegate!(self, tx => TxInternalData::amount(tx))
    }

    fn payload(&self) -> &[u8] {
        delegate!(self, tx => tx.payload())
    }

    fn access_list(&self) -> &AccessList {
        delegate!(self, tx => TxInternalData::access_list(tx))
    }

    fn hash(&self) -> Option<H256> {
        delegate!(self, tx => TxInternalData::hash(tx))
    }

    fn set_hash(&mut self, hash: Option<H256>) {
        delegate!(self, tx => tx.set_hash(hash))
    }

    fn set_signature(&mut self, signatures: TxSignatures) {
        delegate!(self, tx => tx.set_signature(signatures))
    }

    fn raw_signature_values(&self) -> TxSignatures {
        delegate!(self, tx => tx.raw_signature_values())
    }

    fn validate_signature(&self) -> bool {
        delegate!(self, tx => tx.validate_signature())
    }

    fn recover_address<F>(&self, sig_hash: &H256, homestead: bool, vfunc: F) -> TxResult<Address>
    where
        F: Fn(&U256) -> U256,
    {
        delegate!(self, tx => tx.recover_address(sig_hash, homestead, vfunc))
    }

    fn recover_pubkey<F>(
        &self,
        sig_hash: &H256,
        homestead: bool,
        vfunc: F,
    ) -> TxResult<Vec<PublicKey>>
    where
        F: Fn(&U256) -> U256,
    {
        delegate!(self, tx => tx.recover_pubkey(sig_hash, homestead, vfunc))
    }

    fn intrinsic_gas<R: ForkRules + ?Sized>(
        &self,
        block_number: u64,
        rules: &R,
    ) -> TxResult<u64> {
        delegate!(self, tx => tx.intrinsic_gas(block_number, rules))
    }

    fn chain_id(&self) -> U256 {
        delegate!(self, tx => TxInternalData::chain_id(tx))
    }

    fn serialize_for_sign(&self, stream: &mut RlpStream) {
        delegate!(self, tx => tx.serialize_for_sign(stream))
    }

    fn sender_tx_hash(&self) -> H256 {
        delegate!(self, tx => tx.sender_tx_hash())
    }

    fn validate<S: StateDb + ?Sized>(&self, state: &S, block_number: u64) -> TxResult<()> {
        delegate!(self, tx => tx.validate(state, block_number))
    }

    fn validate_mutable_value<S: StateDb + ?Sized>(
        &self,
        state: &S,
        block_number: u64,
    ) -> TxResult<()> {
        delegate!(self, tx => tx.validate_mutable_value(state, block_number))
    }

    fn is_legacy_transaction(&self) -> bool {
        delegate!(self, tx => tx.is_legacy_transaction())
    }

    fn execute<V, S>(
        &self,
        sender: &dyn ContractRef,
        vm: &mut V,
        state: &mut S,
        block_number: u64,
        gas: u64,
        value: U256,
    ) -> ExecutionOutput<V::Error>
    where
        V: Vm + ?Sized,
        S: StateDb + ?Sized,
    {
        delegate!(self, tx => tx.execute(sender, vm, state, block_number, gas, value))
    }

    fn make_rpc_output(&self) -> Map<String, Value> {
        delegate!(self, tx => tx.make_rpc_output())
    }
}

/// Transaction with lazily computed hash and sender
#[derive(Clone, Debug)]
pub struct Transaction {
    data: TxData,
    hash: OnceLock<H256>,
    /// Sender keyed by the chain id of the signer that recovered it
    sender: OnceLock<(U256, Address)>,
}

impl Transaction {
    /// Wrap transaction data
    pub fn new(data: impl Into<TxData>) -> Self {
        Self {
            data: data.into(),
            hash: OnceLock::new(),
            sender: OnceLock::new(),
        }
    }

    /// Inner field container
    pub fn data(&self) -> &TxData {
        &self.data
    }

    /// Consume into the inner field container
    pub fn into_data(self) -> TxData {
        self.data
    }

    /// Transaction type
    pub fn tx_type(&self) -> TxType {
        self.data.tx_type()
    }

    /// Nonce
    pub fn nonce(&self) -> u64 {
        self.data.nonce()
    }

    /// Recipient, `None` for contract creation
    pub fn to(&self) -> Option<&Address> {
        self.data.recipient()
    }

    /// Whether this transaction creates a contract
    pub fn is_contract_creation(&self) -> bool {
        self.data.recipient().is_none()
    }

    /// Identity hash, computed once
    pub fn hash(&self) -> H256 {
        *self.hash.get_or_init(|| self.data.tx_hash())
    }

    /// Typed envelope bytes
    pub fn encode(&self) -> Vec<u8> {
        self.data.encode_typed()
    }

    /// Decode a typed envelope
    pub fn decode(bytes: &[u8]) -> TxResult<Self> {
        let (type_byte, payload) = split_typed(bytes)?;
        let data = TxData::decode_typed(type_byte, payload)?;
        trace!(tx_type = type_byte, len = bytes.len(), "decoded typed transaction");
        Ok(Self::new(data))
    }

    /// Sender as recovered by `signer`.
    ///
    /// Only the first successful recovery is cached, together with its
    /// signer's chain id; other chain ids are recovered on every call.
    pub fn sender(&self, signer: &LondonSigner) -> TxResult<Address> {
        if let Some((chain_id, address)) = self.sender.get() {
            if *chain_id == signer.chain_id() {
                return Ok(*address);
            }
        }
        let address = signer.sender(&self.data)?;
        let _ = self.sender.set((signer.chain_id(), address));
        Ok(address)
    }

    /// Signed copy of this transaction
    pub fn with_signature(&self, signer: &LondonSigner, key: &PrivateKey) -> TxResult<Self> {
        let mut data = self.data.clone();
        signer.sign_tx(&mut data, key)?;
        Ok(Self::new(data))
    }

    /// Intrinsic gas at `block_number`
    pub fn intrinsic_gas<R: ForkRules + ?Sized>(
        &self,
        block_number: u64,
        rules: &R,
    ) -> TxResult<u64> {
        self.data.intrinsic_gas(block_number, rules)
    }

    /// Static validation
    pub fn validate<S: StateDb + ?Sized>(&self, state: &S, block_number: u64) -> TxResult<()> {
        self.data.validate(state, block_number)
    }

    /// Execute against `vm`
    pub fn execute<V, S>(
        &self,
        sender: &dyn ContractRef,
        vm: &mut V,
        state: &mut S,
        block_number: u64,
        gas: u64,
        value: U256,
    ) -> ExecutionOutput<V::Error>
    where
        V: Vm + ?Sized,
        S: StateDb + ?Sized,
    {
        self.data
            .execute(sender, vm, state, block_number, gas, value)
    }

    /// Record the created contract address on `receipt`
    pub fn fill_contract_address(&self, from: &Address, receipt: &mut Receipt) {
        fill_contract_address(&self.data, from, receipt);
    }

    /// RPC projection with the transaction hash added
    pub fn make_rpc_output(&self) -> Map<String, Value> {
        let mut out = self.data.make_rpc_output();
        out.insert("hash".into(), Value::String(self.hash().to_hex()));
        out
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Transaction {}

impl From<DynamicFeeTx> for Transaction {
    fn from(tx: DynamicFeeTx) -> Self {
        Self::new(tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::TxSignature;
    use crate::signer::latest_signer_for_chain_id;
    use ember_crypto::public_key_to_address;
    use rlp::DecoderError;
    use rand::rngs::OsRng;

    fn transfer() -> DynamicFeeTx {
        DynamicFeeTx::builder()
            .nonce(0)
            .to(Address::from_bytes([0x42; 20]))
            .amount(U256::from(10u64).pow(U256::from(18u64)))
            .gas_limit(21000)
            .gas_fee_cap(U256::from(30_000_000_000u64))
            .gas_tip_cap(U256::from(1_000_000_000u64))
            .chain_id(U256::from(1u64))
            .build()
            .unwrap()
    }

    // ==================== Envelope ====================

    #[test]
    fn test_encode_decode() {
        let tx = Transaction::new(transfer());
        let encoded = tx.encode();
        assert_eq!(encoded[0], 0x02);

        let decoded = Transaction::decode(&encoded).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
        assert_eq!(decoded.tx_type(), TxType::DynamicFee);
    }

    #[test]
    fn test_decode_empty() {
        assert!(matches!(
            Transaction::decode(&[]),
            Err(TxError::EmptyTypedTransaction)
        ));
    }

    #[test]
    fn test_decode_unsupported_types() {
        let payload = rlp::encode(&transfer());
        for type_byte in [0x00u8, 0x01, 0x03, 0x7f] {
            let mut bytes = vec![type_byte];
            bytes.extend_from_slice(&payload);
            assert!(matches!(
                Transaction::decode(&bytes),
                Err(TxError::UnsupportedTxType(t)) if t == type_byte
            ));
        }
    }

    #[test]
    fn test_decode_untyped_list() {
        let payload = rlp::encode(&transfer());
        assert!(matches!(
            Transaction::decode(&payload),
            Err(TxError::UnsupportedTxType(b)) if b >= 0xc0
        ));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let encoded = Transaction::new(transfer()).encode();
        let result = Transaction::decode(&encoded[..encoded.len() - 4]);
        assert!(matches!(result, Err(TxError::Rlp(_))));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut encoded = Transaction::new(transfer()).encode();
        encoded.extend_from_slice(&[0xde, 0xad]);
        assert!(matches!(
            Transaction::decode(&encoded),
            Err(TxError::Rlp(DecoderError::RlpIsTooBig))
        ));
    }

    #[test]
    fn test_decode_rejects_empty_string_access_list() {
        // Swap the trailing `0xc0 0x80 0x80 0x80` for `0x80 0x80 0x80 0x80`
        let mut encoded = Transaction::new(transfer()).encode();
        let at = encoded.len() - 4;
        assert_eq!(encoded[at], 0xc0);
        encoded[at] = 0x80;
        assert!(matches!(
            Transaction::decode(&encoded),
            Err(TxError::Rlp(DecoderError::RlpExpectedToBeList))
        ));
    }

    #[test]
    fn test_accepted_bytes_reencode_identically() {
        let key = PrivateKey::random(&mut OsRng);
        let signer = latest_signer_for_chain_id(U256::one());
        let mut data = transfer();
        data.access_list = AccessList::new(vec![crate::access_list::AccessTuple::new(
            Address::from_bytes([0x07; 20]),
            vec![H256::from_bytes([0x08; 32])],
        )]);
        let input = Transaction::new(data)
            .with_signature(&signer, &key)
            .unwrap()
            .encode();

        let decoded = Transaction::decode(&input).unwrap();
        assert_eq!(decoded.encode(), input);
        assert_eq!(decoded.hash(), ember_crypto::keccak256(&input));
    }

    #[test]
    fn test_hash_matches_data_hash() {
        let data = transfer();
        let tx = Transaction::new(data.clone());
        assert_eq!(tx.hash(), data.tx_hash());
        // Cached value is stable
        assert_eq!(tx.hash(), tx.hash());
    }

    // ==================== Signing ====================

    #[test]
    fn test_with_signature_and_sender() {
        let key = PrivateKey::random(&mut OsRng);
        let signer = latest_signer_for_chain_id(U256::one());
        let unsigned = Transaction::new(transfer());

        let signed = unsigned.with_signature(&signer, &key).unwrap();
        assert_ne!(signed.hash(), unsigned.hash());
        assert!(signed.data().validate_signature());

        let expected = public_key_to_address(key.verifying_key());
        assert_eq!(signed.sender(&signer).unwrap(), expected);
        // Served from cache
        assert_eq!(signed.sender(&signer).unwrap(), expected);

        let other = latest_signer_for_chain_id(U256::from(2u64));
        assert!(matches!(
            signed.sender(&other),
            Err(TxError::InvalidChainId { .. })
        ));
    }

    #[test]
    fn test_signed_roundtrip_keeps_sender() {
        let key = PrivateKey::random(&mut OsRng);
        let signer = latest_signer_for_chain_id(U256::one());
        let signed = Transaction::new(transfer())
            .with_signature(&signer, &key)
            .unwrap();

        let decoded = Transaction::decode(&signed.encode()).unwrap();
        assert_eq!(
            decoded.sender(&signer).unwrap(),
            public_key_to_address(key.verifying_key())
        );
    }

    #[test]
    fn test_unsigned_sender_fails() {
        let signer = latest_signer_for_chain_id(U256::one());
        let tx = Transaction::new(transfer());
        assert!(matches!(
            tx.sender(&signer),
            Err(TxError::InvalidSignature)
        ));
    }

    // ==================== Passthroughs ====================

    #[test]
    fn test_rpc_output_includes_hash() {
        let mut data = transfer();
        data.signature = Some(TxSignature::default());
        let tx = Transaction::new(data);
        let out = tx.make_rpc_output();
        assert_eq!(out["hash"], Value::String(tx.hash().to_hex()));
        assert_eq!(out["type"], "TxTypeDynamicFee");
    }

    #[test]
    fn test_fill_contract_address_passthrough() {
        use crate::receipt::TxStatus;

        let mut data = transfer();
        data.recipient = None;
        let tx = Transaction::new(data);
        assert!(tx.is_contract_creation());

        let from = Address::from_bytes([0x01; 20]);
        let mut receipt = Receipt::new(TxStatus::Success, tx.hash(), 53000);
        tx.fill_contract_address(&from, &mut receipt);
        assert_eq!(
            receipt.contract_address,
            Some(ember_crypto::create_address(&from, 0))
        );
    }

    #[test]
    fn test_intrinsic_gas_passthrough() {
        let tx = Transaction::new(transfer());
        let rules = crate::config::Rules {
            is_istanbul: true,
            is_london: true,
            is_shanghai: true,
        };
        assert_eq!(tx.intrinsic_gas(0, &rules).unwrap(), 21000);
    }
}
