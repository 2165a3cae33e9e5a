//! ECDSA sender recovery, shared by the legacy and typed transaction decoders.

use crate::error::DecodeError;
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    Message, SECP256K1,
};

/// Recover the 20-byte Ethereum sender address from a signed transaction's
/// hash and (r, s, recovery_id).
///
/// The address is the last 20 bytes of `keccak256` of the uncompressed
/// public key (minus its leading `0x04` tag byte), matching the standard
/// Ethereum address derivation.
pub fn recover_sender(hash: &[u8; 32], r: &[u8], s: &[u8], recovery_id: u8) -> Result<[u8; 20], DecodeError> {
    let id = RecoveryId::from_i32(recovery_id as i32).map_err(DecodeError::Recovery)?;

    let mut sig_bytes = [0u8; 64];
    pad_into(&mut sig_bytes[..32], r);
    pad_into(&mut sig_bytes[32..], s);

    let signature = RecoverableSignature::from_compact(&sig_bytes, id).map_err(DecodeError::Recovery)?;
    let message = Message::from_digest_slice(hash).expect("hash is 32 bytes; qed");
    let public_key = SECP256K1
        .recover_ecdsa(&message, &signature)
        .map_err(DecodeError::Recovery)?;

    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak_hash::keccak(&uncompressed[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash.0[12..]);
    Ok(address)
}

/// Right-align `src` into `dst`, left-padding with zero bytes. `src` may be
/// shorter than `dst` (RLP strips leading zero bytes from integers).
fn pad_into(dst: &mut [u8], src: &[u8]) {
    let start = dst.len().saturating_sub(src.len());
    dst[start..].copy_from_slice(&src[src.len().saturating_sub(dst.len())..]);
}

/// Derive the recovery id (0 or 1) from a legacy transaction's `v` value,
/// which may be the pre-EIP-155 form (27/28) or the EIP-155 form
/// (`chain_id * 2 + 35/36`).
pub fn legacy_recovery_id(v: u64) -> u8 {
    if v == 27 || v == 28 {
        (v - 27) as u8
    } else if v >= 35 {
        ((v - 35) % 2) as u8
    } else {
        (v % 2) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_recovery_id_pre_eip155() {
        assert_eq!(legacy_recovery_id(27), 0);
        assert_eq!(legacy_recovery_id(28), 1);
    }

    #[test]
    fn legacy_recovery_id_eip155() {
        // chain id 1: v = 1*2+35 = 37 -> id 0, v = 38 -> id 1
        assert_eq!(legacy_recovery_id(37), 0);
        assert_eq!(legacy_recovery_id(38), 1);
    }
}
