//! Normalized records passed between subscribers, decoders and the bus.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized transaction, as produced by the decoder or passed straight
/// through from a node's pending-transaction subscription.
///
/// Extra fields present on the wire (nonce, value, chainId, ...) are kept in
/// `extra` rather than dropped, since downstream consumers may rely on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// 32-byte transaction hash, hex-encoded with a `0x` prefix.
    pub hash: String,
    /// 20-byte sender address, hex-encoded.
    pub from: String,
    /// 20-byte recipient address, hex-encoded, or empty for contract creation.
    #[serde(default)]
    pub to: String,
    /// Call data, hex-encoded.
    #[serde(default)]
    pub data: String,
    /// Envelope type: 0 for legacy, 2 for EIP-1559 typed, etc.
    #[serde(rename = "type")]
    pub tx_type: u8,
    /// Legacy gas price, present on legacy and EIP-2930 transactions. May
    /// arrive as a JSON integer or a hex string; kept verbatim.
    #[serde(rename = "gasPrice", skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<Value>,
    /// EIP-1559 max fee per gas. Mutually exclusive with `gas_price` in
    /// practice, but both are `Option` since we pass through whatever the
    /// source gave us.
    #[serde(rename = "maxFeePerGas", skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<Value>,
    /// Any other fields present on the wire.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TransactionRecord {
    /// Extract an integer gas price, preferring `gasPrice` then
    /// `maxFeePerGas`. Values may be JSON integers or `0x`-prefixed hex
    /// strings. Returns `None` if neither field is present or parseable.
    pub fn gas_price_wei(&self) -> Option<u128> {
        self.gas_price
            .as_ref()
            .or(self.max_fee_per_gas.as_ref())
            .and_then(parse_int_value)
    }
}

/// A transaction record flowing through the pending/finalized queues.
///
/// This is always a JSON object, but not always shaped like
/// [`TransactionRecord`]: transactions that arrive directly from a node's
/// own pending-transaction or receipt subscription are queued exactly as
/// the node sent them (field names and all, e.g. `input` instead of
/// `data`), while transactions decoded from raw bytes (Arbitrum sequencer
/// frames) are queued as the normalized [`TransactionRecord`] shape. Both
/// cases agree on `hash`, `gasPrice` and `maxFeePerGas`, which is all the
/// pipeline needs to route and filter them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueuedTransaction(pub Value);

impl From<TransactionRecord> for QueuedTransaction {
    fn from(record: TransactionRecord) -> Self {
        Self(serde_json::to_value(record).expect("TransactionRecord always serializes"))
    }
}

impl QueuedTransaction {
    /// Wrap a raw JSON transaction object as received from a node subscription.
    pub fn from_raw(value: Value) -> Self {
        Self(value)
    }

    /// The transaction hash, if present.
    pub fn hash(&self) -> Option<&str> {
        self.0.get("hash")?.as_str()
    }

    /// An integer gas price, preferring `gasPrice` then `maxFeePerGas`.
    /// Values may be JSON integers or `0x`-prefixed hex strings.
    pub fn gas_price_wei(&self) -> Option<u128> {
        self.0
            .get("gasPrice")
            .or_else(|| self.0.get("maxFeePerGas"))
            .and_then(parse_int_value)
    }
}

/// Parse a JSON value that's either a plain integer or a `0x`-prefixed hex string.
pub fn parse_int_value(value: &Value) -> Option<u128> {
    match value {
        Value::Number(n) => n.as_u128(),
        Value::String(s) => {
            let s = s.strip_prefix("0x").unwrap_or(s);
            u128::from_str_radix(s, 16).ok()
        }
        _ => None,
    }
}

/// A block header as delivered by the `newHeads` subscription. Only the
/// fields the block subscriber acts on are named; everything else rides
/// along in `extra` and is never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block number, hex-encoded.
    pub number: String,
    /// Block timestamp (unix seconds), hex-encoded.
    pub timestamp: String,
    /// Any other header fields (hash, parentHash, gasUsed, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BlockHeader {
    /// Decode `number` from hex to an integer.
    pub fn number_u64(&self) -> Option<u64> {
        parse_hex_u64(&self.number)
    }

    /// Decode `timestamp` from hex to an integer.
    pub fn timestamp_u64(&self) -> Option<u64> {
        parse_hex_u64(&self.timestamp)
    }
}

fn parse_hex_u64(s: &str) -> Option<u64> {
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}

/// A log record as delivered by the `logs` subscription. The event
/// subscriber only needs `topics` and `block_number` to make filtering
/// decisions; the full record (`raw`) is what actually gets published to
/// the bus, preserved exactly as the node sent it.
#[derive(Debug, Clone)]
pub struct EventLog {
    /// The subscription result object, unmodified.
    pub raw: Value,
}

impl EventLog {
    /// Wrap an event log result object (the `result` field of an
    /// `eth_subscription` notification for the `logs` subscription).
    pub fn from_result(raw: Value) -> Self {
        Self { raw }
    }

    fn result(&self) -> Option<&Map<String, Value>> {
        self.raw.as_object()
    }

    /// `topics[0]`, if present and non-empty (anonymous events have no topics).
    pub fn topic0(&self) -> Option<&str> {
        self.result()?
            .get("topics")?
            .as_array()?
            .first()?
            .as_str()
    }

    /// `blockNumber`, decoded from hex.
    pub fn block_number(&self) -> Option<u64> {
        let hex = self.result()?.get("blockNumber")?.as_str()?;
        parse_hex_u64(hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_price_prefers_gas_price_over_max_fee() {
        let record = TransactionRecord {
            hash: "0x1".into(),
            from: "0xf".into(),
            to: String::new(),
            data: String::new(),
            tx_type: 0,
            gas_price: Some(Value::String("0xb".into())),
            max_fee_per_gas: Some(Value::Number(1.into())),
            extra: Map::new(),
        };
        assert_eq!(record.gas_price_wei(), Some(11));
    }

    #[test]
    fn event_log_reads_topic0_and_block_number() {
        let raw = serde_json::json!({
            "blockNumber": "0x10",
            "topics": ["0xdead"]
        });
        let log = EventLog::from_result(raw);
        assert_eq!(log.topic0(), Some("0xdead"));
        assert_eq!(log.block_number(), Some(16));
    }

    #[test]
    fn event_log_with_no_topics_has_no_topic0() {
        let raw = serde_json::json!({ "blockNumber": "0x1", "topics": [] });
        let log = EventLog::from_result(raw);
        assert_eq!(log.topic0(), None);
    }
}
