//! A thin publish/set abstraction over a Redis-compatible key/value +
//! pub/sub endpoint.
//!
//! [`Bus`] wraps a single [`redis::aio::ConnectionManager`], which handles
//! its own reconnection and is cheaply [`Clone`]able, so every subscriber
//! can hold its own handle to the same underlying connection without extra
//! locking. Publication is best-effort: failures are logged and swallowed,
//! since a bus hiccup should never take down an ingestion subscriber.

mod error;

pub use error::BusError;

use redis::AsyncCommands;
use serde::Serialize;
use tracing::error;

/// A handle to the pub/sub + key/value bus. Cheap to clone; all clones
/// share the same underlying connection.
#[derive(Clone)]
pub struct Bus {
    connection: redis::aio::ConnectionManager,
}

impl Bus {
    /// Connect to a Redis-compatible endpoint at `url` (e.g. `redis://localhost:6379`).
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }

    /// Publish `payload`, serialized as compact JSON, onto `channel`.
    ///
    /// Errors are logged and otherwise ignored: publication is best-effort.
    pub async fn publish<T: Serialize>(&self, channel: &str, payload: &T) {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => {
                error!(channel, error = %err, "failed to serialize bus payload");
                return;
            }
        };

        let mut connection = self.connection.clone();
        if let Err(err) = connection.publish::<_, _, ()>(channel, body).await {
            error!(channel, error = %err, "failed to publish to bus");
        }
    }

    /// Set `key` to `payload`, serialized as compact JSON.
    ///
    /// Errors are logged and otherwise ignored.
    pub async fn set<T: Serialize>(&self, key: &str, payload: &T) {
        let body = match serde_json::to_string(payload) {
            Ok(body) => body,
            Err(err) => {
                error!(key, error = %err, "failed to serialize bus payload");
                return;
            }
        };

        let mut connection = self.connection.clone();
        if let Err(err) = connection.set::<_, _, ()>(key, body).await {
            error!(key, error = %err, "failed to set bus key");
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus").finish()
    }
}
