//! Errors surfaced by bootstrap and the supervisor. Everything below this
//! layer (decode errors, transport errors, RPC errors) is scoped to a
//! single record, attempt, or connection lifetime and never reaches here.

/// Errors that can abort startup before any subscriber has been launched.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The chain name given on the command line isn't one this service knows about.
    #[error(transparent)]
    Config(#[from] chainwatch_core::ConfigError),
    /// Could not reach the bus endpoint.
    #[error("bus connection failed: {0}")]
    Bus(#[from] chainwatch_bus::BusError),
    /// Could not open the initial websocket connection while bootstrapping.
    #[error("rpc error during bootstrap: {0}")]
    Rpc(#[from] chainwatch_rpcs::Error),
    /// The HTTP status surface failed to bind its listener.
    #[error("http status surface failed to start: {0}")]
    Http(#[source] std::io::Error),
}
