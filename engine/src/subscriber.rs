//! The common shape every long-lived subscriber task implements.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// A task that owns one websocket (or, for the finalized worker, one
/// queue) for the lifetime of the process. `run` only returns once `cancel`
/// is observed; any transport failure is handled internally by
/// reconnecting, never by returning early.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Run until `cancel` fires.
    async fn run(&self, cancel: CancellationToken);
}
