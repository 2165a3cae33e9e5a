//! Pure transaction decoding: legacy RLP, EIP-2718 typed envelopes, and
//! Arbitrum sequencer frames wrapping either of the above.

mod arbitrum;
mod legacy;
mod recover;
mod typed;

pub use arbitrum::decode_frame as decode_arbitrum_frame;

use crate::error::DecodeError;
use crate::types::TransactionRecord;

/// The boundary between a typed (EIP-2718) envelope and a legacy RLP
/// transaction: typed envelopes begin with a byte in `0x00..=0x7f`
/// (transaction type), legacy transactions begin with an RLP list prefix,
/// which is always `>= 0xc0`.
const TYPED_ENVELOPE_MAX_PREFIX: u8 = 0x7f;

/// Decode a raw transaction byte-string into a normalized record.
///
/// `hash` is supplied by the caller rather than recomputed here, since the
/// caller (a websocket subscriber or the Arbitrum frame decoder) already
/// knows the right input to hash (the full legacy encoding, or the
/// envelope-prefixed bytes for typed transactions).
pub fn decode_evm_tx(bytes: &[u8], hash: [u8; 32]) -> Result<TransactionRecord, DecodeError> {
    match bytes.first() {
        None => Err(DecodeError::EmptyPayload),
        Some(&first) if first <= TYPED_ENVELOPE_MAX_PREFIX => typed::decode(bytes, hash),
        Some(_) => legacy::decode(bytes, hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_is_an_error() {
        assert!(matches!(decode_evm_tx(&[], [0; 32]), Err(DecodeError::EmptyPayload)));
    }

    #[test]
    fn dispatches_typed_envelope_by_leading_byte() {
        // type byte 0x02 (EIP-1559) with empty payload: should hit the typed
        // decoder and fail at RLP parsing, not be misrouted to the legacy decoder.
        let err = decode_evm_tx(&[0x02], [0; 32]);
        assert!(err.is_err());
    }
}
