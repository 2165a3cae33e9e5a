//! Maintains the `newHeads` subscription: block cadence, base fees, and
//! (for chains where receipts arrive by pull) triggering the receipt fetcher.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chainwatch_bus::Bus;
use chainwatch_core::types::{BlockHeader, QueuedTransaction};
use chainwatch_rpcs::client::{rpc_params, RpcClient};
use chainwatch_rpcs::receipts::{fetch_receipts, ReceiptFetcher};
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::ChainState;
use crate::subscriber::Subscriber;

const BLOCK_TIME_WINDOW: usize = 100;
const COOPERATIVE_PAUSE: Duration = Duration::from_millis(10);

/// Rolling window of block timestamps used to compute `average_blocktime`.
struct BlockTimes(VecDeque<u64>);

impl BlockTimes {
    fn seeded() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs();
        let mut deque = VecDeque::with_capacity(BLOCK_TIME_WINDOW);
        deque.push_back(now.saturating_sub(12));
        Self(deque)
    }

    fn push(&mut self, timestamp: u64) {
        self.0.push_back(timestamp);
        if self.0.len() > BLOCK_TIME_WINDOW {
            self.0.pop_front();
        }
    }

    /// `(last - first) / (len - 1)`, or `None` if fewer than two samples exist.
    fn average(&self) -> Option<f64> {
        if self.0.len() < 2 {
            return None;
        }
        let first = *self.0.front().expect("checked len >= 2");
        let last = *self.0.back().expect("checked len >= 2");
        Some(last.saturating_sub(first) as f64 / (self.0.len() - 1) as f64)
    }
}

pub struct BlockSubscriber {
    websocket_uri: String,
    http_client: reqwest::Client,
    http_uri: String,
    receipt_fetcher: Option<ReceiptFetcher>,
    state: Arc<ChainState>,
    bus: Bus,
}

impl BlockSubscriber {
    pub fn new(
        websocket_uri: String,
        http_client: reqwest::Client,
        http_uri: String,
        receipt_fetcher: Option<ReceiptFetcher>,
        state: Arc<ChainState>,
        bus: Bus,
    ) -> Self {
        Self {
            websocket_uri,
            http_client,
            http_uri,
            receipt_fetcher,
            state,
            bus,
        }
    }

    async fn fetch_base_fees(client: &RpcClient) -> (u64, u64) {
        let result: Result<Value, _> = client
            .request("eth_feeHistory", rpc_params![1, "latest", Vec::<f64>::new()])
            .await;

        let fees = match result {
            Ok(value) => value
                .get("baseFeePerGas")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            Err(err) => {
                warn!(error = %err, "fee history request failed");
                Vec::new()
            }
        };

        let as_u64 = |v: &Value| -> u64 {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok()))
                .unwrap_or(0)
        };

        match fees.as_slice() {
            [last, next] => (as_u64(last), as_u64(next)),
            [last] => (as_u64(last), 0),
            _ => (0, 0),
        }
    }

    async fn maybe_fetch_receipts(&self, block_number_hex: &str) {
        let Some(fetcher) = self.receipt_fetcher else {
            return;
        };
        let receipts = fetch_receipts(&self.http_client, &self.http_uri, fetcher, block_number_hex).await;
        for receipt in receipts {
            self.state.finalized().push(QueuedTransaction::from_raw(receipt));
        }
    }

    async fn run_connection(&self, cancel: &CancellationToken) {
        let client = match RpcClient::from_insecure_url(&self.websocket_uri).await {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "block subscriber failed to connect, retrying");
                return;
            }
        };

        self.state.reset_first_block();
        self.state.set_watching_blocks(false);

        let mut subscription = match client
            .subscribe::<BlockHeader>("eth_subscribe", rpc_params!["newHeads"], "eth_unsubscribe")
            .await
        {
            Ok(sub) => sub,
            Err(err) => {
                warn!(error = %err, "block subscriber failed to subscribe, retrying");
                return;
            }
        };
        info!("subscription active: new blocks");
        self.state.set_watching_blocks(true);

        let mut block_times = BlockTimes::seeded();

        loop {
            let header = tokio::select! {
                _ = cancel.cancelled() => return,
                header = subscription.next() => header,
            };

            let header = match header {
                Some(Ok(header)) => header,
                Some(Err(err)) => {
                    warn!(error = %err, "block subscription error, reconnecting");
                    break;
                }
                None => {
                    warn!("block subscription closed, reconnecting");
                    break;
                }
            };

            let Some(number) = header.number_u64() else {
                continue;
            };
            let Some(timestamp) = header.timestamp_u64() else {
                continue;
            };

            self.state.observe_block(number, timestamp);
            block_times.push(timestamp);
            if let Some(average) = block_times.average() {
                self.state.set_average_blocktime(average);
            }
            self.state.observe_first_block(number);

            let (last, next) = Self::fetch_base_fees(&client).await;
            self.state.set_base_fees(last, next);

            self.maybe_fetch_receipts(&header.number).await;

            self.bus.set("app_state", &self.state.snapshot()).await;

            sleep(COOPERATIVE_PAUSE).await;
        }

        self.state.set_watching_blocks(false);
    }
}

#[async_trait]
impl Subscriber for BlockSubscriber {
    async fn run(&self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            self.run_connection(&cancel).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_is_none_until_two_samples() {
        let mut times = BlockTimes(VecDeque::from([10]));
        assert_eq!(times.average(), None);
        times.push(22);
        assert_eq!(times.average(), Some(12.0));
    }

    #[test]
    fn window_drops_oldest_sample_past_capacity() {
        let mut times = BlockTimes(VecDeque::new());
        for t in 0..=BLOCK_TIME_WINDOW as u64 {
            times.push(t * 12);
        }
        assert_eq!(times.0.len(), BLOCK_TIME_WINDOW);
        assert_eq!(times.0.front().copied(), Some(12));
    }
}
