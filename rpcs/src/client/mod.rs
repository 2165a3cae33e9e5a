//! RPC types and client for interacting with an Ethereum-family node.
//!
//! The core bits are:
//!
//! - [`RpcClientT`] is the underlying dynamic RPC implementation. This provides
//!   the low level [`RpcClientT::request_raw`] and [`RpcClientT::subscribe_raw`]
//!   methods.
//! - [`RpcClient`] is the higher level wrapper around this, offering
//!   the [`RpcClient::request`] and [`RpcClient::subscribe`] methods, and is
//!   cheaply cloneable so every subscriber can hold its own handle.
//!
//! Reconnection is deliberately not hidden inside this client: the block,
//! event and transaction subscribers each need to observe the exact moment
//! a connection drops (to reset `first_block`/`first_event` and the
//! `watching_*` flags), so they own their own connect/subscribe/reconnect
//! loop and just use [`RpcClient::from_insecure_url`] to get a fresh handle
//! each time.

mod jsonrpsee_impl;
mod rpc_client;
mod rpc_client_t;

pub use jsonrpsee::core::client::Client as JsonrpseeRpcClient;
pub use rpc_client::{rpc_params, RpcClient, RpcParams, RpcSubscription};
pub use rpc_client_t::{RawRpcFuture, RawRpcSubscription, RawValue, RpcClientT};
