//! Errors surfaced only at connection time; everyday publish/set failures
//! are logged internally and never propagated (see [`crate::Bus`]).

/// Errors that can occur connecting to the bus.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BusError {
    /// The bus endpoint URL could not be parsed, or the initial connection failed.
    #[error("bus connection error: {0}")]
    Connection(#[from] redis::RedisError),
}
