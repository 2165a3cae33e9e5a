//! The fixed set of event topic0 values this service republishes.

use std::sync::OnceLock;

const SIGNATURES: &[&str] = &[
    "Sync(uint112,uint112)",
    "Mint(address,address,int24,int24,uint128,uint256,uint256)",
    "Burn(address,int24,int24,uint128,uint256,uint256)",
    "Swap(address,address,int256,int256,uint160,uint128,int24)",
    "PairCreated(address,address,address,uint256)",
    "PoolCreated(address,address,uint24,int24,address)",
];

static EVENT_SIGNATURES: OnceLock<Vec<String>> = OnceLock::new();

/// The keccak256 topic0 hashes of the event signatures this service cares
/// about, each hex-encoded with a `0x` prefix. Computed once on first use.
pub fn event_signatures() -> &'static [String] {
    EVENT_SIGNATURES
        .get_or_init(|| {
            SIGNATURES
                .iter()
                .map(|sig| format!("0x{}", hex::encode(keccak_hash::keccak(sig.as_bytes()).0)))
                .collect()
        })
        .as_slice()
}

/// Whether `topic0` (as it appears on the wire, `0x`-prefixed lowercase hex)
/// is one of the signatures this service republishes.
pub fn is_known_signature(topic0: &str) -> bool {
    event_signatures().iter().any(|sig| sig.eq_ignore_ascii_case(topic0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_six_signatures() {
        assert_eq!(event_signatures().len(), 6);
        for sig in event_signatures() {
            assert!(sig.starts_with("0x"));
            assert_eq!(sig.len(), 66);
        }
    }

    #[test]
    fn recognizes_sync_signature() {
        let sync = &event_signatures()[0];
        assert!(is_known_signature(sync));
        assert!(is_known_signature(&sync.to_uppercase().replace("0X", "0x")));
    }

    #[test]
    fn rejects_unrelated_topic() {
        assert!(!is_known_signature("0x0000000000000000000000000000000000000000000000000000000000000000"));
    }
}
