//! Startup: resolve chain config, open the bus connection and an initial
//! RPC connection to discover `chain_id`, and construct [`ChainState`].

use std::sync::Arc;

use chainwatch_bus::Bus;
use chainwatch_core::{chain, ChainConfig, ChainName};
use chainwatch_rpcs::client::{rpc_params, RpcClient};
use serde_json::Value;
use tracing::info;

use crate::error::EngineError;
use crate::state::{ChainState, QueueReceivers};

/// Everything the supervisor needs to start the subscribers and HTTP surface.
pub struct Bootstrapped {
    pub config: ChainConfig,
    pub state: Arc<ChainState>,
    pub queues: QueueReceivers,
    pub bus: Bus,
    pub http_client: reqwest::Client,
}

/// Resolve `chain_name`'s configuration, open a bus connection and a
/// throwaway RPC connection to discover `chain_id` and the current block
/// number, then seed a fresh [`ChainState`].
pub async fn bootstrap(chain_name: ChainName, bus_url: &str) -> Result<Bootstrapped, EngineError> {
    let config = chain::lookup(chain_name);

    let rpc = RpcClient::from_insecure_url(&config.websocket_uri).await?;
    let chain_id = fetch_chain_id(&rpc).await?;
    let newest_block = fetch_block_number(&rpc).await.unwrap_or(0);

    let bus = Bus::connect(bus_url).await?;
    let http_client = reqwest::Client::new();

    let (state, queues) = ChainState::new(chain_name, config.node, chain_id);
    state.observe_block(newest_block, 0);
    state.set_live(true);

    info!(chain = chain_name.as_str(), chain_id, newest_block, "bootstrap complete");

    Ok(Bootstrapped {
        config,
        state,
        queues,
        bus,
        http_client,
    })
}

async fn fetch_chain_id(rpc: &RpcClient) -> Result<u64, EngineError> {
    let raw: Value = rpc.request("eth_chainId", rpc_params![]).await?;
    Ok(parse_hex_u64(&raw).unwrap_or(0))
}

async fn fetch_block_number(rpc: &RpcClient) -> Option<u64> {
    let raw: Value = rpc.request("eth_blockNumber", rpc_params![]).await.ok()?;
    parse_hex_u64(&raw)
}

fn parse_hex_u64(value: &Value) -> Option<u64> {
    let s = value.as_str()?;
    u64::from_str_radix(s.strip_prefix("0x").unwrap_or(s), 16).ok()
}
