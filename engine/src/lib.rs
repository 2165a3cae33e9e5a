//! Subscribers, shared chain state, the HTTP status surface and the
//! supervisor that wires them together into one running chain-observation
//! process.

pub mod bootstrap;
pub mod error;
pub mod http;
pub mod state;
pub mod subscriber;
pub mod subscribers;
pub mod supervisor;

pub use bootstrap::{bootstrap, Bootstrapped};
pub use error::EngineError;
pub use state::ChainState;
pub use subscriber::Subscriber;
