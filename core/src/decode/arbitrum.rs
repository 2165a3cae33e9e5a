//! Decoding of Arbitrum sequencer feed frames into normalized transactions.

use super::decode_evm_tx;
use crate::error::DecodeError;
use crate::types::TransactionRecord;
use base64::Engine;
use serde_json::Value;

const L1_MESSAGE_KIND_L2: u64 = 3;
const L2_MESSAGE_TYPE_SIGNED_TX: u8 = 0x04;

/// Decode every signed transaction carried in one sequencer feed frame.
///
/// A frame carries a `messages` array; each entry whose
/// `message.message.header.kind == 3` wraps an L2 message in
/// `message.message.l2Msg`, base64-encoded. If the decoded bytes start with
/// `0x04` (a signed transaction), the remainder is hashed and decoded as an
/// ordinary EVM transaction. Anything else in the frame is skipped.
pub fn decode_frame(frame: &Value) -> Vec<Result<TransactionRecord, DecodeError>> {
    let Some(messages) = frame.get("messages").and_then(Value::as_array) else {
        return Vec::new();
    };

    messages
        .iter()
        .filter_map(decode_one_message)
        .collect()
}

fn decode_one_message(message: &Value) -> Option<Result<TransactionRecord, DecodeError>> {
    let header = message.pointer("/message/message/header")?;
    let kind = header.get("kind")?.as_u64()?;
    if kind != L1_MESSAGE_KIND_L2 {
        return None;
    }

    let l2_msg = message.pointer("/message/message/l2Msg")?.as_str()?;
    Some(decode_l2_message(l2_msg))
}

fn decode_l2_message(l2_msg_base64: &str) -> Result<TransactionRecord, DecodeError> {
    let raw = base64::engine::general_purpose::STANDARD.decode(l2_msg_base64)?;
    let (&tag, rest) = raw.split_first().ok_or(DecodeError::EmptyPayload)?;
    if tag != L2_MESSAGE_TYPE_SIGNED_TX {
        return Err(DecodeError::UnexpectedL2MessageType(tag));
    }

    let hash = keccak_hash::keccak(rest).0;
    decode_evm_tx(rest, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ignores_frame_with_no_messages_field() {
        assert!(decode_frame(&json!({})).is_empty());
    }

    #[test]
    fn skips_messages_with_non_l2_kind() {
        let frame = json!({
            "messages": [{
                "message": { "message": { "header": { "kind": 0 } } }
            }]
        });
        assert!(decode_frame(&frame).is_empty());
    }

    #[test]
    fn rejects_l2_message_with_wrong_type_byte() {
        // base64 of a single 0x01 byte
        let result = decode_l2_message("AQ==");
        assert!(matches!(result, Err(DecodeError::UnexpectedL2MessageType(1))));
    }
}
