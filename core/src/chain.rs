//! Static per-chain configuration.
//!
//! The table here stands in for whatever configuration store a deployment
//! actually uses (environment variables, a secrets manager, a config file).
//! It exists so the rest of the crate has somewhere concrete to resolve a
//! chain name to connection endpoints and a node-family classification.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// The set of chains this service knows how to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainName {
    /// Ethereum mainnet.
    Ethereum,
    /// Arbitrum One (and compatible Arbitrum Orbit chains).
    Arbitrum,
    /// Base.
    Base,
    /// Optimism.
    Optimism,
    /// Polygon PoS.
    Polygon,
    /// Avalanche C-Chain.
    Avalanche,
}

impl ChainName {
    /// Parse a chain name from the string a user passed on the command line.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "ethereum" => Ok(Self::Ethereum),
            "arbitrum" => Ok(Self::Arbitrum),
            "base" => Ok(Self::Base),
            "optimism" => Ok(Self::Optimism),
            "polygon" => Ok(Self::Polygon),
            "avalanche" => Ok(Self::Avalanche),
            other => Err(ConfigError::InvalidChainName(other.to_owned())),
        }
    }

    /// The string used in logs, bus payloads and the `app_state` record.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Arbitrum => "arbitrum",
            Self::Base => "base",
            Self::Optimism => "optimism",
            Self::Polygon => "polygon",
            Self::Avalanche => "avalanche",
        }
    }
}

/// The upstream node provider a chain's endpoints are backed by. This
/// determines which pending-transaction subscription dialect (if any) is
/// available, and whether the receipt fetcher needs to filter deposit
/// receipts out of a batch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeFamily {
    /// A vanilla node (geth/erigon/nitro) exposing the standard JSON-RPC surface.
    Node,
    /// Alchemy, which offers the `alchemy_pendingTransactions` subscription.
    Alchemy,
    /// Infura, which does not offer pending-transaction subscriptions.
    Infura,
}

/// Resolved configuration for a single chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Which chain this is.
    pub chain_name: ChainName,
    /// Which node family backs `websocket_uri` / `http_uri`.
    pub node: NodeFamily,
    /// Websocket endpoint used for `eth_subscribe`-based subscriptions.
    pub websocket_uri: String,
    /// HTTP endpoint used for request/response JSON-RPC calls (receipts).
    pub http_uri: String,
    /// Arbitrum sequencer feed endpoint. Only present for Arbitrum-family chains.
    pub sequencer_uri: Option<String>,
}

/// How a chain's pending transactions should be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSubscriptionStrategy {
    /// Subscribe to `newPendingTransactions` on a vanilla node websocket.
    NodePendingTransactions,
    /// Subscribe to `alchemy_pendingTransactions`.
    AlchemyPendingTransactions,
    /// Decode transactions out of the Arbitrum sequencer feed.
    ArbitrumSequencer,
    /// This chain/node combination has no pending-transaction source.
    Unsupported,
}

impl ChainConfig {
    /// Which strategy the transaction subscriber should use for this chain.
    pub fn tx_subscription_strategy(&self) -> TxSubscriptionStrategy {
        if self.chain_name == ChainName::Arbitrum {
            return TxSubscriptionStrategy::ArbitrumSequencer;
        }
        // Base/Optimism pull their transactions from the finalized (receipt)
        // pipeline when alchemy-backed; a pending subscription here would
        // double-publish the same transactions through both pipelines.
        if matches!(self.chain_name, ChainName::Base | ChainName::Optimism) && self.node == NodeFamily::Alchemy {
            return TxSubscriptionStrategy::Unsupported;
        }
        match self.node {
            NodeFamily::Node => TxSubscriptionStrategy::NodePendingTransactions,
            NodeFamily::Alchemy => TxSubscriptionStrategy::AlchemyPendingTransactions,
            NodeFamily::Infura => TxSubscriptionStrategy::Unsupported,
        }
    }
}

/// Look up the static configuration for a chain.
///
/// This default table points at placeholder endpoints; a real deployment
/// overrides it (the specific mechanism for doing so is left to the
/// deployment, the same way the original service reads it out of an
/// external module at import time).
pub fn lookup(chain_name: ChainName) -> ChainConfig {
    match chain_name {
        ChainName::Ethereum => ChainConfig {
            chain_name,
            node: NodeFamily::Alchemy,
            websocket_uri: "wss://eth-mainnet.g.alchemy.com/v2/placeholder".into(),
            http_uri: "https://eth-mainnet.g.alchemy.com/v2/placeholder".into(),
            sequencer_uri: None,
        },
        ChainName::Arbitrum => ChainConfig {
            chain_name,
            node: NodeFamily::Node,
            websocket_uri: "wss://arb1.arbitrum.io/ws".into(),
            http_uri: "https://arb1.arbitrum.io/rpc".into(),
            sequencer_uri: Some("wss://arb1-sequencer.arbitrum.io/feed".into()),
        },
        ChainName::Base => ChainConfig {
            chain_name,
            node: NodeFamily::Node,
            websocket_uri: "wss://base-rpc.publicnode.com".into(),
            http_uri: "https://base-rpc.publicnode.com".into(),
            sequencer_uri: None,
        },
        ChainName::Optimism => ChainConfig {
            chain_name,
            node: NodeFamily::Node,
            websocket_uri: "wss://optimism-rpc.publicnode.com".into(),
            http_uri: "https://optimism-rpc.publicnode.com".into(),
            sequencer_uri: None,
        },
        ChainName::Polygon => ChainConfig {
            chain_name,
            node: NodeFamily::Alchemy,
            websocket_uri: "wss://polygon-mainnet.g.alchemy.com/v2/placeholder".into(),
            http_uri: "https://polygon-mainnet.g.alchemy.com/v2/placeholder".into(),
            sequencer_uri: None,
        },
        ChainName::Avalanche => ChainConfig {
            chain_name,
            node: NodeFamily::Infura,
            websocket_uri: "wss://avalanche-mainnet.infura.io/ws/v3/placeholder".into(),
            http_uri: "https://avalanche-mainnet.infura.io/v3/placeholder".into(),
            sequencer_uri: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_known_chains() {
        for name in ["ethereum", "arbitrum", "base", "optimism", "polygon", "avalanche"] {
            assert!(ChainName::parse(name).is_ok());
        }
    }

    #[test]
    fn rejects_unknown_chain() {
        assert!(matches!(
            ChainName::parse("nonexistent"),
            Err(ConfigError::InvalidChainName(_))
        ));
    }

    #[test]
    fn arbitrum_always_uses_sequencer_strategy() {
        let cfg = lookup(ChainName::Arbitrum);
        assert_eq!(
            cfg.tx_subscription_strategy(),
            TxSubscriptionStrategy::ArbitrumSequencer
        );
    }

    #[test]
    fn infura_backed_chain_has_no_pending_tx_strategy() {
        let cfg = lookup(ChainName::Avalanche);
        assert_eq!(cfg.tx_subscription_strategy(), TxSubscriptionStrategy::Unsupported);
    }

    #[test]
    fn alchemy_backed_base_and_optimism_have_no_pending_tx_strategy() {
        for chain_name in [ChainName::Base, ChainName::Optimism] {
            let cfg = ChainConfig {
                chain_name,
                node: NodeFamily::Alchemy,
                websocket_uri: "wss://example.invalid".into(),
                http_uri: "https://example.invalid".into(),
                sequencer_uri: None,
            };
            assert_eq!(
                cfg.tx_subscription_strategy(),
                TxSubscriptionStrategy::Unsupported,
                "{chain_name:?} + alchemy must run the finalized-only pipeline"
            );
        }
    }
}
