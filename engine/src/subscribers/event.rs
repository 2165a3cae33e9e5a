//! Maintains the `logs` subscription: buffers incoming events, filters by
//! topic0 against the known signature set, and publishes to `cream_events`.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chainwatch_bus::Bus;
use chainwatch_core::event_signatures::is_known_signature;
use chainwatch_core::types::EventLog;
use chainwatch_rpcs::client::{rpc_params, RpcClient};
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::ChainState;
use crate::subscriber::Subscriber;

const COOPERATIVE_PAUSE: Duration = Duration::from_millis(100);

pub struct EventSubscriber {
    websocket_uri: String,
    state: Arc<ChainState>,
    bus: Bus,
}

impl EventSubscriber {
    pub fn new(websocket_uri: String, state: Arc<ChainState>, bus: Bus) -> Self {
        Self {
            websocket_uri,
            state,
            bus,
        }
    }

    /// Pop and publish everything currently buffered, in order. Invariant
    /// I7: this always runs to completion before the next `recv`.
    async fn drain(&self, buffer: &mut VecDeque<EventLog>) {
        while self.state.live() {
            let Some(event) = buffer.pop_front() else {
                break;
            };
            if let Some(topic0) = event.topic0() {
                if is_known_signature(topic0) {
                    self.bus.publish("cream_events", &event.raw).await;
                }
            }
            tokio::task::yield_now().await;
        }
    }

    async fn run_connection(&self, cancel: &CancellationToken) {
        let client = match RpcClient::from_insecure_url(&self.websocket_uri).await {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "event subscriber failed to connect, retrying");
                return;
            }
        };

        self.state.set_watching_events(false);
        self.state.reset_first_event();

        let mut subscription = match client
            .subscribe::<Value>("eth_subscribe", rpc_params!["logs", serde_json::json!({})], "eth_unsubscribe")
            .await
        {
            Ok(sub) => sub,
            Err(err) => {
                warn!(error = %err, "event subscriber failed to subscribe, retrying");
                return;
            }
        };
        info!("subscription active: events");
        self.state.set_watching_events(true);

        let mut buffer: VecDeque<EventLog> = VecDeque::new();

        loop {
            self.drain(&mut buffer).await;

            let message = tokio::select! {
                _ = cancel.cancelled() => return,
                message = subscription.next() => message,
            };

            let raw = match message {
                Some(Ok(raw)) => raw,
                Some(Err(err)) => {
                    warn!(error = %err, "event subscription error, reconnecting");
                    break;
                }
                None => {
                    warn!("event subscription closed, reconnecting");
                    break;
                }
            };

            let event = EventLog::from_result(raw);

            if let Some(block_number) = event.block_number() {
                self.state.observe_first_event(block_number);
            }

            if event.topic0().is_some() {
                buffer.push_back(event);
            }

            sleep(COOPERATIVE_PAUSE).await;
        }

        self.state.set_watching_events(false);
    }
}

#[async_trait]
impl Subscriber for EventSubscriber {
    async fn run(&self, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            self.run_connection(&cancel).await;
        }
    }
}
