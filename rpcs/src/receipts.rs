//! HTTP JSON-RPC receipt fetching, with the retry/backoff policy used by
//! the block subscriber to pull transaction receipts for chains that don't
//! push them over a subscription.

use chainwatch_core::ChainName;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, warn};

const MAX_ATTEMPTS: u32 = 5;
const INITIAL_DELAY: Duration = Duration::from_millis(500);
const FIRST_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Which JSON-RPC call shape to use to pull receipts for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptFetcher {
    /// `alchemy_getTransactionReceipts`, receipts at `.result.receipts`.
    Alchemy,
    /// `eth_getBlockByNumber(block, true)`, receipts at `.result.transactions`.
    Node,
    /// Same shape as [`ReceiptFetcher::Node`]; kept distinct since Infura is
    /// occasionally special-cased elsewhere in the pipeline.
    Infura,
}

impl ReceiptFetcher {
    /// Pick the fetcher variant for a chain/node pair, mirroring the block
    /// subscriber's dispatch table: alchemy-backed base/optimism pull via
    /// Alchemy's batch endpoint, node-backed base pulls the block, and
    /// infura-backed avalanche pulls the block too.
    pub fn for_chain(chain_name: ChainName, node: chainwatch_core::NodeFamily) -> Option<Self> {
        use chainwatch_core::NodeFamily as N;
        match (chain_name, node) {
            (ChainName::Base, N::Alchemy) | (ChainName::Optimism, N::Alchemy) => Some(Self::Alchemy),
            (ChainName::Base, N::Node) => Some(Self::Node),
            (ChainName::Avalanche, N::Infura) => Some(Self::Infura),
            _ => None,
        }
    }

    fn request_body(&self, block_number_hex: &str) -> Value {
        match self {
            Self::Alchemy => json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "alchemy_getTransactionReceipts",
                "params": [{ "blockNumber": block_number_hex }],
            }),
            Self::Node | Self::Infura => json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "eth_getBlockByNumber",
                "params": [block_number_hex, true],
            }),
        }
    }

    fn receipts_pointer(&self) -> &'static str {
        match self {
            Self::Alchemy => "/result/receipts",
            Self::Node | Self::Infura => "/result/transactions",
        }
    }
}

/// The outcome of one HTTP attempt.
enum AttemptOutcome {
    /// A non-empty receipts array: done, no more retries.
    Receipts(Vec<Value>),
    /// An empty receipts array: treated as "no data", not retried.
    Empty,
    /// Transport failure, bad JSON, or an `error` field: retry.
    Retry,
}

async fn attempt(
    client: &reqwest::Client,
    http_uri: &str,
    fetcher: ReceiptFetcher,
    block_number_hex: &str,
) -> AttemptOutcome {
    let body = fetcher.request_body(block_number_hex);
    let response = match client.post(http_uri).json(&body).send().await {
        Ok(r) => r,
        Err(err) => {
            warn!(error = %err, "receipt fetch transport error, retrying");
            return AttemptOutcome::Retry;
        }
    };

    let value: Value = match response.json().await {
        Ok(v) => v,
        Err(err) => {
            warn!(error = %err, "receipt fetch response was not valid json, retrying");
            return AttemptOutcome::Retry;
        }
    };

    if let Some(error) = value.get("error") {
        warn!(%error, "error fetching block transactions, retrying");
        return AttemptOutcome::Retry;
    }

    let receipts = value
        .pointer(fetcher.receipts_pointer())
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    if receipts.is_empty() {
        AttemptOutcome::Empty
    } else {
        AttemptOutcome::Receipts(receipts)
    }
}

/// Fetch receipts for `block_number_hex`, retrying up to 5 times with an
/// initial 0.5s delay before the first attempt and a delay that doubles
/// (1, 2, 4, 8, 16s) between subsequent attempts. Optimism system
/// transactions (`type == "0x7e"`) are filtered out of the result. Returns
/// an empty vector if the upstream reports no data for the block, or if
/// retries are exhausted; this fetcher never surfaces an error to the
/// caller, matching the best-effort nature of the pipeline it feeds.
pub async fn fetch_receipts(
    client: &reqwest::Client,
    http_uri: &str,
    fetcher: ReceiptFetcher,
    block_number_hex: &str,
) -> Vec<Value> {
    tokio::time::sleep(INITIAL_DELAY).await;

    let mut delay = FIRST_RETRY_DELAY;
    for _ in 0..MAX_ATTEMPTS {
        match attempt(client, http_uri, fetcher, block_number_hex).await {
            AttemptOutcome::Receipts(receipts) => {
                return receipts
                    .into_iter()
                    .filter(|receipt| receipt.get("type").and_then(Value::as_str) != Some("0x7e"))
                    .collect();
            }
            AttemptOutcome::Empty => {
                warn!(block_number_hex, "no receipts found in block");
                return Vec::new();
            }
            AttemptOutcome::Retry => {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    error!(block_number_hex, attempts = MAX_ATTEMPTS, "failed to fetch block transactions");
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alchemy_points_at_receipts_array() {
        assert_eq!(ReceiptFetcher::Alchemy.receipts_pointer(), "/result/receipts");
    }

    #[test]
    fn node_and_infura_point_at_transactions_array() {
        assert_eq!(ReceiptFetcher::Node.receipts_pointer(), "/result/transactions");
        assert_eq!(ReceiptFetcher::Infura.receipts_pointer(), "/result/transactions");
    }

    #[test]
    fn chain_dispatch_matches_the_documented_table() {
        use chainwatch_core::NodeFamily;
        assert_eq!(
            ReceiptFetcher::for_chain(ChainName::Base, NodeFamily::Alchemy),
            Some(ReceiptFetcher::Alchemy)
        );
        assert_eq!(
            ReceiptFetcher::for_chain(ChainName::Base, NodeFamily::Node),
            Some(ReceiptFetcher::Node)
        );
        assert_eq!(
            ReceiptFetcher::for_chain(ChainName::Avalanche, NodeFamily::Infura),
            Some(ReceiptFetcher::Infura)
        );
        assert_eq!(ReceiptFetcher::for_chain(ChainName::Ethereum, NodeFamily::Alchemy), None);
    }
}
