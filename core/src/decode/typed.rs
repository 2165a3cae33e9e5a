//! EIP-2718 typed transaction decoding (EIP-2930 access-list and EIP-1559 fee-market).

use super::recover::recover_sender;
use crate::error::DecodeError;
use crate::types::TransactionRecord;
use rlp::Rlp;
use serde_json::{Map, Value};

const TYPE_ACCESS_LIST: u8 = 1;
const TYPE_DYNAMIC_FEE: u8 = 2;

/// Decode a typed transaction envelope: a one-byte type prefix followed by
/// an RLP-encoded payload. `hash` is keccak256 of the full envelope
/// (prefix included), as used on the wire.
pub fn decode(bytes: &[u8], hash: [u8; 32]) -> Result<TransactionRecord, DecodeError> {
    let (tx_type, payload) = bytes.split_first().ok_or(DecodeError::EmptyPayload)?;
    let rlp = Rlp::new(payload);

    match *tx_type {
        TYPE_ACCESS_LIST => decode_access_list(&rlp, hash),
        TYPE_DYNAMIC_FEE => decode_dynamic_fee(&rlp, hash),
        other => Err(DecodeError::UnsupportedType(other)),
    }
}

fn decode_access_list(rlp: &Rlp, hash: [u8; 32]) -> Result<TransactionRecord, DecodeError> {
    // [chainId, nonce, gasPrice, gasLimit, to, value, data, accessList, v, r, s]
    if rlp.item_count()? != 11 {
        return Err(DecodeError::Rlp(rlp::DecoderError::RlpIncorrectListLen));
    }
    let gas_price: Vec<u8> = rlp.val_at(2)?;
    let to: Vec<u8> = rlp.val_at(4)?;
    let data: Vec<u8> = rlp.val_at(6)?;
    let (from, v) = recover_from_tail(rlp, 8, &hash)?;

    Ok(build_record(hash, from, to, data, TYPE_ACCESS_LIST, Some(gas_price), None, v))
}

fn decode_dynamic_fee(rlp: &Rlp, hash: [u8; 32]) -> Result<TransactionRecord, DecodeError> {
    // [chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data, accessList, v, r, s]
    if rlp.item_count()? != 12 {
        return Err(DecodeError::Rlp(rlp::DecoderError::RlpIncorrectListLen));
    }
    let max_fee_per_gas: Vec<u8> = rlp.val_at(3)?;
    let to: Vec<u8> = rlp.val_at(5)?;
    let data: Vec<u8> = rlp.val_at(7)?;
    let (from, v) = recover_from_tail(rlp, 9, &hash)?;

    Ok(build_record(hash, from, to, data, TYPE_DYNAMIC_FEE, None, Some(max_fee_per_gas), v))
}

/// The last three RLP fields of a typed transaction are always `(v, r, s)`,
/// where `v` is the y-parity (0 or 1) directly, unlike legacy's encoded form.
fn recover_from_tail(rlp: &Rlp, v_index: usize, hash: &[u8; 32]) -> Result<([u8; 20], u64), DecodeError> {
    let v: u64 = rlp.val_at(v_index)?;
    let r: Vec<u8> = rlp.val_at(v_index + 1)?;
    let s: Vec<u8> = rlp.val_at(v_index + 2)?;
    let recovery_id = (v % 2) as u8;
    let from = recover_sender(hash, &r, &s, recovery_id)?;
    Ok((from, v))
}

#[allow(clippy::too_many_arguments)]
fn build_record(
    hash: [u8; 32],
    from: [u8; 20],
    to: Vec<u8>,
    data: Vec<u8>,
    tx_type: u8,
    gas_price: Option<Vec<u8>>,
    max_fee_per_gas: Option<Vec<u8>>,
    v: u64,
) -> TransactionRecord {
    let mut extra = Map::new();
    extra.insert("v".into(), Value::String(format!("0x{v:x}")));

    TransactionRecord {
        hash: format!("0x{}", hex::encode(hash)),
        from: format!("0x{}", hex::encode(from)),
        to: if to.is_empty() { String::new() } else { format!("0x{}", hex::encode(to)) },
        data: format!("0x{}", hex::encode(data)),
        tx_type,
        gas_price: gas_price.map(|b| Value::String(format!("0x{}", hex::encode(nonzero(&b))))),
        max_fee_per_gas: max_fee_per_gas.map(|b| Value::String(format!("0x{}", hex::encode(nonzero(&b))))),
        extra,
    }
}

fn nonzero(bytes: &[u8]) -> &[u8] {
    if bytes.is_empty() {
        &[0]
    } else {
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_type_byte() {
        let err = decode(&[0x03, 0xc0], [0u8; 32]);
        assert!(matches!(err, Err(DecodeError::UnsupportedType(3))));
    }

    #[test]
    fn rejects_empty_payload() {
        let err = decode(&[], [0u8; 32]);
        assert!(matches!(err, Err(DecodeError::EmptyPayload)));
    }
}
