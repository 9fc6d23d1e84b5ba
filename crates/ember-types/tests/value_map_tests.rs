//! Keyed-value construction tests for ember-types

use ember_primitives::{Address, U256};
use ember_types::{
    parse_tx_values, AccessList, CodeFormat, DynamicFeeTx, TxBuildError, TxInternalData, TxType,
    TxValue, TxValueKey,
};

fn entries() -> Vec<(&'static str, TxValue)> {
    vec![
        ("nonce", TxValue::from(1u64)),
        ("to", TxValue::from(Address::from_bytes([0x0a; 20]))),
        ("amount", TxValue::from(U256::from(7u64))),
        ("data", TxValue::from(vec![0x60, 0x00])),
        ("gasLimit", TxValue::from(100_000u64)),
        ("gasFeeCap", TxValue::from(U256::from(25u64))),
        ("gasTipCap", TxValue::from(U256::from(1u64))),
        ("accessList", TxValue::from(AccessList::default())),
        ("chainId", TxValue::from(U256::from(1001u64))),
    ]
}

#[test]
fn test_build_from_tokens() {
    let mut values = parse_tx_values(entries()).unwrap();
    let tx = DynamicFeeTx::from_values(&mut values).unwrap();

    assert_eq!(tx.tx_type(), TxType::DynamicFee);
    assert_eq!(tx.nonce, 1);
    assert_eq!(tx.recipient, Some(Address::from_bytes([0x0a; 20])));
    assert_eq!(&tx.payload[..], &[0x60, 0x00]);
    assert_eq!(tx.gas_fee_cap, U256::from(25u64));
    assert_eq!(tx.chain_id, Some(U256::from(1001u64)));
    assert!(tx.signature.is_none());
    assert!(values.is_empty());
}

#[test]
fn test_unknown_token_rejected() {
    let mut list = entries();
    list.push(("gasPremium", TxValue::from(1u64)));
    assert_eq!(
        parse_tx_values(list).unwrap_err(),
        TxBuildError::UnknownKey("gasPremium".to_string())
    );
}

#[test]
fn test_leftover_keys_reported_by_name() {
    let mut list = entries();
    list.push(("codeFormat", TxValue::from(CodeFormat::Evm)));
    list.push(("gasPrice", TxValue::from(U256::from(1u64))));
    let mut values = parse_tx_values(list).unwrap();

    let err = DynamicFeeTx::from_values(&mut values).unwrap_err();
    assert_eq!(
        err.to_string(),
        "undefined key remains: TxValueKeyGasPrice, TxValueKeyCodeFormat"
    );
    assert_eq!(values.len(), 2);
}

#[test]
fn test_missing_recipient_is_an_error() {
    let mut values = parse_tx_values(entries()).unwrap();
    values.remove(&TxValueKey::To);
    assert_eq!(
        DynamicFeeTx::from_values(&mut values).unwrap_err(),
        TxBuildError::ToMustBeAddress
    );
}

#[test]
fn test_amount_must_be_big_int() {
    let mut values = parse_tx_values(entries()).unwrap();
    values.insert(TxValueKey::Amount, TxValue::from(7u64));
    assert_eq!(
        DynamicFeeTx::from_values(&mut values).unwrap_err(),
        TxBuildError::AmountMustBeBigInt
    );
    assert_eq!(values.get(&TxValueKey::Amount), Some(&TxValue::Uint64(7)));
}
