//! Low level JSON-RPC client used to talk to Ethereum-family nodes over
//! websocket and HTTP, plus the HTTP receipt fetcher.

pub mod client;
pub mod receipts;
pub mod sequencer;
pub mod utils;

// Expose the most common things at the top level:
pub use client::{RpcClient, RpcClientT};
pub use receipts::{fetch_receipts, ReceiptFetcher};
pub use sequencer::SequencerFeed;

/// This encapsulates any errors that could be emitted in this crate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An error coming from the underlying RPC Client.
    #[error("RPC error: client error: {0}")]
    Client(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// The connection was lost; callers should reconnect and resubscribe.
    #[error("RPC error: the connection was lost ({0})")]
    Disconnected(String),
    /// Cannot deserialize the response.
    #[error("RPC error: cannot deserialize response: {0}")]
    Deserialization(serde_json::Error),
    /// The requested URL is insecure.
    #[error("RPC error: insecure URL: {0}")]
    InsecureUrl(String),
    /// The receipt fetcher's HTTP transport failed.
    #[error("RPC error: http transport: {0}")]
    Http(#[from] reqwest::Error),
    /// The JSON-RPC response carried an `error` field.
    #[error("RPC error: node returned an error: {0}")]
    Rpc(String),
}
