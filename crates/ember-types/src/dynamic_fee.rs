//! EIP-1559 dynamic-fee transaction (type 2)

use crate::access_list::{AccessList, AccessTuple};
use crate::error::{TxBuildError, TxError, TxResult};
use crate::execution::{CodeFormat, ContractRef, ExecutionOutput, StateDb, Vm};
use crate::gas::{intrinsic_gas, ForkRules};
use crate::hexutil;
use crate::internal_data::TxInternalData;
use crate::signature::{derive_chain_id, recover_plain, recover_plain_pubkey, TxSignature, TxSignatures};
use crate::signer::latest_signer_for_chain_id;
use crate::tx_type::{RoleType, TxType};
use crate::value_key::{take_value, TxValue, TxValueKey, TxValues};
use bytes::Bytes;
use ember_crypto::{keccak256, validate_signature_values, PublicKey};
use ember_primitives::{Address, H256, U256};
use ember_rlp::{append_nullable, decode_nullable, encode, encode_typed, expect_list_len};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;
use tracing::{debug, error, warn};

/// Number of items in the wire encoding
const WIRE_FIELDS: usize = 12;

/// Dynamic-fee transaction fields
#[derive(Clone, Debug)]
pub struct DynamicFeeTx {
    /// Chain ID; `None` means derive it from the signature.
    /// The wire format writes `None` as 0, so a derived chain id only survives JSON.
    pub chain_id: Option<U256>,
    /// Account nonce
    pub nonce: u64,
    /// Max priority fee per gas
    pub gas_tip_cap: U256,
    /// Max fee per gas
    pub gas_fee_cap: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient (None for contract creation)
    pub recipient: Option<Address>,
    /// Transferred value
    pub amount: U256,
    /// Call input or init code
    pub payload: Bytes,
    /// Access list
    pub access_list: AccessList,
    /// Signature, `None` until signed
    pub signature: Option<TxSignature>,
    /// Cached identity hash (JSON and display only)
    pub hash: Option<H256>,
}

impl DynamicFeeTx {
    /// Uninitialized instance, used as a decode target
    pub fn empty() -> Self {
        Self {
            chain_id: None,
            nonce: 0,
            gas_tip_cap: U256::zero(),
            gas_fee_cap: U256::zero(),
            gas_limit: 0,
            recipient: None,
            amount: U256::zero(),
            payload: Bytes::new(),
            access_list: AccessList::default(),
            signature: None,
            hash: None,
        }
    }

    /// Zero-valued instance with a zero chain id
    pub fn zeroed() -> Self {
        Self {
            chain_id: Some(U256::zero()),
            ..Self::empty()
        }
    }

    /// Instance from explicit values. Inputs are copied; `None` caps and
    /// amount stay zero.
    #[allow(clippy::too_many_arguments)]
    pub fn with_values(
        nonce: u64,
        to: Option<Address>,
        amount: Option<U256>,
        gas_limit: u64,
        gas_tip_cap: Option<U256>,
        gas_fee_cap: Option<U256>,
        data: &[u8],
        access_list: &[AccessTuple],
        chain_id: Option<U256>,
    ) -> Self {
        let mut tx = Self::zeroed();
        tx.nonce = nonce;
        tx.recipient = to;
        tx.gas_limit = gas_limit;
        tx.payload = Bytes::copy_from_slice(data);
        tx.access_list = AccessList(access_list.to_vec());
        if let Some(amount) = amount {
            tx.amount = amount;
        }
        if let Some(tip) = gas_tip_cap {
            tx.gas_tip_cap = tip;
        }
        if let Some(fee) = gas_fee_cap {
            tx.gas_fee_cap = fee;
        }
        if let Some(chain_id) = chain_id {
            tx.chain_id = Some(chain_id);
        }
        tx
    }

    /// Instance from keyed values.
    ///
    /// Consumed keys are removed from `values`. Fails on the first missing or
    /// mistyped key, and when keys this type does not use remain.
    pub fn from_values(values: &mut TxValues) -> Result<Self, TxBuildError> {
        let mut tx = Self::zeroed();

        tx.nonce = take_value(
            values,
            TxValueKey::Nonce,
            |v| match v {
                TxValue::Uint64(n) => Some(*n),
                _ => None,
            },
            TxBuildError::NonceMustBeUint64,
        )?;
        tx.recipient = Some(take_value(
            values,
            TxValueKey::To,
            |v| match v {
                TxValue::Address(a) => Some(*a),
                _ => None,
            },
            TxBuildError::ToMustBeAddress,
        )?);
        tx.amount = take_value(values, TxValueKey::Amount, big_int, TxBuildError::AmountMustBeBigInt)?;
        tx.payload = take_value(
            values,
            TxValueKey::Data,
            |v| match v {
                TxValue::Bytes(b) => Some(Bytes::copy_from_slice(b)),
                _ => None,
            },
            TxBuildError::DataMustBeBytes,
        )?;
        tx.gas_limit = take_value(
            values,
            TxValueKey::GasLimit,
            |v| match v {
                TxValue::Uint64(n) => Some(*n),
                _ => None,
            },
            TxBuildError::GasLimitMustBeUint64,
        )?;
        tx.gas_fee_cap = take_value(
            values,
            TxValueKey::GasFeeCap,
            big_int,
            TxBuildError::GasFeeCapMustBeBigInt,
        )?;
        tx.gas_tip_cap = take_value(
            values,
            TxValueKey::GasTipCap,
            big_int,
            TxBuildError::GasTipCapMustBeBigInt,
        )?;
        tx.access_list = take_value(
            values,
            TxValueKey::AccessList,
            |v| match v {
                TxValue::AccessList(list) => Some(list.clone()),
                _ => None,
            },
            TxBuildError::AccessListInvalid,
        )?;
        tx.chain_id = Some(take_value(
            values,
            TxValueKey::ChainId,
            big_int,
            TxBuildError::ChainIdInvalid,
        )?);

        if !values.is_empty() {
            let remaining: Vec<TxValueKey> = values.keys().copied().collect();
            for key in &remaining {
                warn!(key = %key, "unnecessary key");
            }
            return Err(TxBuildError::UndefinedKeyRemains(remaining));
        }

        Ok(tx)
    }

    /// Typed builder
    pub fn builder() -> DynamicFeeTxBuilder {
        DynamicFeeTxBuilder::default()
    }

    /// Attached signature, or the zero placeholder
    pub fn signature_or_placeholder(&self) -> TxSignature {
        self.signature.clone().unwrap_or_default()
    }

    /// Typed envelope bytes: `0x02 || rlp(tx)`
    pub fn encode_typed(&self) -> Vec<u8> {
        encode_typed(TxType::DynamicFee.as_u8(), &encode(self))
    }

    /// Transaction hash: `keccak256(0x02 || rlp(tx))`
    pub fn tx_hash(&self) -> H256 {
        keccak256(&self.encode_typed())
    }

    /// Whether this transaction creates a contract
    pub fn is_contract_creation(&self) -> bool {
        self.recipient.is_none()
    }
}

fn big_int(value: &TxValue) -> Option<U256> {
    match value {
        TxValue::BigInt(v) => Some(*v),
        _ => None,
    }
}

impl Default for DynamicFeeTx {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl PartialEq for DynamicFeeTx {
    fn eq(&self, other: &Self) -> bool {
        self.chain_id == other.chain_id
            && self.nonce == other.nonce
            && self.gas_fee_cap == other.gas_fee_cap
            && self.gas_tip_cap == other.gas_tip_cap
            && self.gas_limit == other.gas_limit
            && self.recipient == other.recipient
            && self.amount == other.amount
            && self.payload == other.payload
            && self.access_list.len() == other.access_list.len()
            && self
                .access_list
                .iter()
                .zip(other.access_list.iter())
                .all(|(a, b)| a.address == b.address && a.storage_keys == b.storage_keys)
            && self.signature_or_placeholder() == other.signature_or_placeholder()
    }
}

impl Eq for DynamicFeeTx {}

// ============================================================================
// Builder
// ============================================================================

/// Typed builder for [`DynamicFeeTx`].
///
/// Nonce, gas limit, both fee caps and chain id are mandatory; the rest
/// default to contract creation with zero value, no data and no access list.
#[derive(Clone, Debug, Default)]
pub struct DynamicFeeTxBuilder {
    nonce: Option<u64>,
    to: Option<Address>,
    amount: U256,
    data: Bytes,
    gas_limit: Option<u64>,
    gas_fee_cap: Option<U256>,
    gas_tip_cap: Option<U256>,
    access_list: AccessList,
    chain_id: Option<U256>,
}

impl DynamicFeeTxBuilder {
    /// Set nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set recipient
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Set transferred value
    pub fn amount(mut self, amount: U256) -> Self {
        self.amount = amount;
        self
    }

    /// Set payload
    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Set gas limit
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Set max fee per gas
    pub fn gas_fee_cap(mut self, cap: U256) -> Self {
        self.gas_fee_cap = Some(cap);
        self
    }

    /// Set max priority fee per gas
    pub fn gas_tip_cap(mut self, cap: U256) -> Self {
        self.gas_tip_cap = Some(cap);
        self
    }

    /// Set access list
    pub fn access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = access_list;
        self
    }

    /// Set chain id
    pub fn chain_id(mut self, chain_id: U256) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    /// Build the transaction
    pub fn build(self) -> Result<DynamicFeeTx, TxBuildError> {
        let nonce = self.nonce.ok_or(TxBuildError::NonceMustBeUint64)?;
        let gas_limit = self.gas_limit.ok_or(TxBuildError::GasLimitMustBeUint64)?;
        let gas_fee_cap = self.gas_fee_cap.ok_or(TxBuildError::GasFeeCapMustBeBigInt)?;
        let gas_tip_cap = self.gas_tip_cap.ok_or(TxBuildError::GasTipCapMustBeBigInt)?;
        let chain_id = self.chain_id.ok_or(TxBuildError::ChainIdInvalid)?;

        Ok(DynamicFeeTx {
            chain_id: Some(chain_id),
            nonce,
            gas_tip_cap,
            gas_fee_cap,
            gas_limit,
            recipient: self.to,
            amount: self.amount,
            payload: self.data,
            access_list: self.access_list,
            signature: None,
            hash: None,
        })
    }
}

// ============================================================================
// TxInternalData
// ============================================================================

impl TxInternalData for DynamicFeeTx {
    fn tx_type(&self) -> TxType {
        TxType::DynamicFee
    }

    fn role_type(&self) -> RoleType {
        RoleType::Transaction
    }

    fn nonce(&self) -> u64 {
        self.nonce
    }

    fn price(&self) -> U256 {
        self.gas_fee_cap
    }

    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    fn recipient(&self) -> Option<&Address> {
        self.recipient.as_ref()
    }

    fn amount(&self) -> U256 {
        self.amount
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }

    fn access_list(&self) -> &AccessList {
        &self.access_list
    }

    fn hash(&self) -> Option<H256> {
        self.hash
    }

    fn set_hash(&mut self, hash: Option<H256>) {
        self.hash = hash;
    }

    fn set_signature(&mut self, signatures: TxSignatures) {
        if signatures.len() != 1 {
            error!(
                count = signatures.len(),
                "dynamic fee transaction can receive only a single signature"
            );
            panic!(
                "dynamic fee transaction can receive only a single signature, got {}",
                signatures.len()
            );
        }
        self.signature = signatures.into_iter().next();
    }

    fn raw_signature_values(&self) -> TxSignatures {
        vec![self.signature_or_placeholder()]
    }

    fn validate_signature(&self) -> bool {
        let sig = self.signature_or_placeholder();
        let v = sig.v.low_u64() as u8;
        validate_signature_values(v, &sig.r, &sig.s, true)
    }

    fn recover_address<F>(&self, sig_hash: &H256, homestead: bool, vfunc: F) -> TxResult<Address>
    where
        F: Fn(&U256) -> U256,
    {
        let sig = self.signature_or_placeholder();
        let v = vfunc(&sig.v);
        recover_plain(sig_hash, &sig.r, &sig.s, &v, homestead)
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
        let sig = self.signature_or_placeholder();
        let v = vfunc(&sig.v);
        let public_key = recover_plain_pubkey(sig_hash, &sig.r, &sig.s, &v, homestead)?;
        Ok(vec![public_key])
    }

    fn intrinsic_gas<R: ForkRules + ?Sized>(
        &self,
        block_number: u64,
        rules: &R,
    ) -> TxResult<u64> {
        intrinsic_gas(
            &self.payload,
            &self.access_list,
            self.recipient.is_none(),
            &rules.rules(block_number),
        )
    }

    fn chain_id(&self) -> U256 {
        match self.chain_id {
            Some(chain_id) => chain_id,
            None => derive_chain_id(&self.signature_or_placeholder().v),
        }
    }

    fn serialize_for_sign(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_tip_cap);
        stream.append(&self.gas_fee_cap);
        stream.append(&self.gas_limit);
        append_nullable(stream, self.recipient.as_ref());
        stream.append(&self.amount);
        stream.encoder().encode_value(&self.payload);
        stream.append(&self.access_list);
    }

    fn sender_tx_hash(&self) -> H256 {
        let sig = self.signature_or_placeholder();
        let mut stream = RlpStream::new_list(WIRE_FIELDS);
        stream.append(&self.chain_id.unwrap_or_default());
        stream.append(&self.nonce);
        stream.append(&self.gas_tip_cap);
        stream.append(&self.gas_fee_cap);
        stream.append(&self.gas_limit);
        append_nullable(&mut stream, self.recipient.as_ref());
        stream.append(&self.amount);
        stream.encoder().encode_value(&self.payload);
        stream.append(&self.access_list);
        stream.append(&sig.v);
        stream.append(&sig.r);
        stream.append(&sig.s);
        keccak256(&encode_typed(TxType::DynamicFee.as_u8(), &stream.out()))
    }

    fn validate<S: StateDb + ?Sized>(&self, state: &S, block_number: u64) -> TxResult<()> {
        if let Some(to) = &self.recipient {
            if to.is_precompiled_contract() {
                return Err(TxError::PrecompiledContractAddress);
            }
        }
        self.validate_mutable_value(state, block_number)
    }

    fn validate_mutable_value<S: StateDb + ?Sized>(
        &self,
        _state: &S,
        _block_number: u64,
    ) -> TxResult<()> {
        Ok(())
    }

    fn is_legacy_transaction(&self) -> bool {
        false
    }

    fn execute<V, S>(
        &self,
        sender: &dyn ContractRef,
        vm: &mut V,
        state: &mut S,
        _block_number: u64,
        gas: u64,
        value: U256,
    ) -> ExecutionOutput<V::Error>
    where
        V: Vm + ?Sized,
        S: StateDb + ?Sized,
    {
        match &self.recipient {
            // Creation increments the sender nonce itself
            None => vm
                .create(sender, &self.payload, gas, value, CodeFormat::Evm)
                .into(),
            Some(to) => {
                state.inc_nonce(&sender.address());
                vm.call(sender, to, &self.payload, gas, value)
            }
        }
    }

    fn make_rpc_output(&self) -> Map<String, Value> {
        let sig = self.signature_or_placeholder();
        let mut out = Map::new();
        out.insert("typeInt".into(), Value::from(self.tx_type().as_u8()));
        out.insert("chainId".into(), hexutil::encode_big(&TxInternalData::chain_id(self)).into());
        out.insert("type".into(), self.tx_type().name().into());
        out.insert("gas".into(), hexutil::encode_uint64(self.gas_limit).into());
        out.insert(
            "maxPriorityFeePerGas".into(),
            hexutil::encode_big(&self.gas_tip_cap).into(),
        );
        out.insert("maxFeePerGas".into(), hexutil::encode_big(&self.gas_fee_cap).into());
        out.insert("input".into(), hexutil::encode_bytes(&self.payload).into());
        out.insert("nonce".into(), hexutil::encode_uint64(self.nonce).into());
        out.insert(
            "to".into(),
            self.recipient
                .map_or(Value::Null, |to| Value::String(to.to_hex())),
        );
        out.insert("value".into(), hexutil::encode_big(&self.amount).into());
        out.insert("accessList".into(), access_list_value(&self.access_list));
        out.insert(
            "signatures".into(),
            json!([{
                "v": hexutil::encode_big(&sig.v),
                "r": hexutil::encode_big(&sig.r),
                "s": hexutil::encode_big(&sig.s),
            }]),
        );
        out
    }
}

fn access_list_value(list: &AccessList) -> Value {
    Value::Array(
        list.iter()
            .map(|tuple| {
                let keys: Vec<String> = tuple.storage_keys.iter().map(H256::to_hex).collect();
                json!({ "address": tuple.address.to_hex(), "storageKeys": keys })
            })
            .collect(),
    )
}

// ============================================================================
// RLP (wire encoding)
// ============================================================================

impl Encodable for DynamicFeeTx {
    fn rlp_append(&self, s: &mut RlpStream) {
        let sig = self.signature_or_placeholder();
        s.begin_list(WIRE_FIELDS);
        s.append(&self.chain_id.unwrap_or_default());
        s.append(&self.nonce);
        s.append(&self.gas_tip_cap);
        s.append(&self.gas_fee_cap);
        s.append(&self.gas_limit);
        append_nullable(s, self.recipient.as_ref());
        s.append(&self.amount);
        s.encoder().encode_value(&self.payload);
        s.append(&self.access_list);
        s.append(&sig.v);
        s.append(&sig.r);
        s.append(&sig.s);
    }
}

impl Decodable for DynamicFeeTx {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        expect_list_len(rlp, WIRE_FIELDS)?;
        let payload: Vec<u8> = rlp.val_at(7)?;
        Ok(Self {
            chain_id: Some(rlp.val_at(0)?),
            nonce: rlp.val_at(1)?,
            gas_tip_cap: rlp.val_at(2)?,
            gas_fee_cap: rlp.val_at(3)?,
            gas_limit: rlp.val_at(4)?,
            recipient: decode_nullable(&rlp.at(5)?)?,
            amount: rlp.val_at(6)?,
            payload: Bytes::from(payload),
            access_list: rlp.val_at(8)?,
            signature: Some(TxSignature {
                v: rlp.val_at(9)?,
                r: rlp.val_at(10)?,
                s: rlp.val_at(11)?,
            }),
            hash: None,
        })
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicFeeTxJson {
    #[serde(default)]
    type_int: Option<u8>,
    #[serde(rename = "type", default)]
    type_name: Option<String>,
    #[serde(with = "hexutil::uint64")]
    nonce: u64,
    #[serde(with = "hexutil::big")]
    max_priority_fee_per_gas: U256,
    #[serde(with = "hexutil::big")]
    max_fee_per_gas: U256,
    #[serde(with = "hexutil::uint64")]
    gas: u64,
    #[serde(default)]
    to: Option<Address>,
    #[serde(with = "hexutil::big")]
    value: U256,
    #[serde(with = "hexutil::bytes")]
    input: Bytes,
    signatures: TxSignatures,
    #[serde(default)]
    access_list: AccessList,
    #[serde(default, with = "hexutil::opt_big")]
    chain_id: Option<U256>,
    #[serde(default)]
    hash: Option<H256>,
}

impl Serialize for DynamicFeeTx {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DynamicFeeTxJson {
            type_int: Some(TxType::DynamicFee.as_u8()),
            type_name: Some(TxType::DynamicFee.name().to_string()),
            nonce: self.nonce,
            max_priority_fee_per_gas: self.gas_tip_cap,
            max_fee_per_gas: self.gas_fee_cap,
            gas: self.gas_limit,
            to: self.recipient,
            value: self.amount,
            input: self.payload.clone(),
            signatures: vec![self.signature_or_placeholder()],
            access_list: self.access_list.clone(),
            chain_id: self.chain_id,
            hash: self.hash,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DynamicFeeTx {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = DynamicFeeTxJson::deserialize(deserializer)?;

        let mut signatures = json.signatures.into_iter();
        let signature = match (signatures.next(), signatures.next()) {
            (Some(sig), None) => sig,
            (None, _) => return Err(de::Error::custom("signatures must not be empty")),
            (Some(_), Some(_)) => {
                return Err(de::Error::custom(
                    "dynamic fee transaction takes exactly one signature",
                ))
            }
        };

        Ok(DynamicFeeTx {
            chain_id: json.chain_id,
            nonce: json.nonce,
            gas_tip_cap: json.max_priority_fee_per_gas,
            gas_fee_cap: json.max_fee_per_gas,
            gas_limit: json.gas,
            recipient: json.to,
            amount: json.value,
            payload: json.input,
            access_list: json.access_list,
            signature: Some(signature),
            hash: json.hash,
        })
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for DynamicFeeTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain_id = TxInternalData::chain_id(self);
        let signer = latest_signer_for_chain_id(chain_id);
        let from = match signer.sender(self) {
            Ok(from) => hex::encode(from.as_bytes()),
            Err(e) => {
                debug!(error = %e, "could not recover sender for display");
                "[invalid sender: invalid sig]".to_string()
            }
        };
        let to = match &self.recipient {
            Some(to) => hex::encode(to.as_bytes()),
            None => "[contract creation]".to_string(),
        };
        let sig = self.signature_or_placeholder();
        let enc = encode(self);

        writeln!(f)?;
        writeln!(f, "\tTX({})", hex::encode(self.tx_hash().as_bytes()))?;
        writeln!(f, "\tContract:   {}", self.recipient.is_none())?;
        writeln!(f, "\tChainId:    {}", hexutil::encode_big(&chain_id))?;
        writeln!(f, "\tFrom:       {}", from)?;
        writeln!(f, "\tTo:         {}", to)?;
        writeln!(f, "\tNonce:      {}", self.nonce)?;
        writeln!(f, "\tGasTipCap:  {}", hexutil::encode_big(&self.gas_tip_cap))?;
        writeln!(f, "\tGasFeeCap:  {}", hexutil::encode_big(&self.gas_fee_cap))?;
        writeln!(f, "\tGasLimit:   {}", hexutil::encode_uint64(self.gas_limit))?;
        writeln!(f, "\tValue:      {}", hexutil::encode_big(&self.amount))?;
        writeln!(f, "\tData:       {}", hexutil::encode_bytes(&self.payload))?;
        writeln!(f, "\tAccessList: {}", self.access_list)?;
        writeln!(f, "\tV:          {}", hexutil::encode_big(&sig.v))?;
        writeln!(f, "\tR:          {}", hexutil::encode_big(&sig.r))?;
        writeln!(f, "\tS:          {}", hexutil::encode_big(&sig.s))?;
        writeln!(f, "\tHex:        {}", hex::encode(&enc))
    }
}
