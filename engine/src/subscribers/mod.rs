//! The concrete [`crate::subscriber::Subscriber`] implementations, one per
//! websocket the service maintains, plus the two plain worker loops that
//! drain the pending/finalized queues.

mod block;
mod event;
mod transaction;

pub use block::BlockSubscriber;
pub use event::EventSubscriber;
pub use transaction::{run_finalized_worker, run_pending_worker, TransactionSubscriber};
