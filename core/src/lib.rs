//! Pure data types, static chain configuration, and transaction decoding.
//!
//! Nothing in this crate performs I/O: it exists so the engine crate (which
//! owns websockets, HTTP clients and the bus connection) can depend on a
//! side-effect-free layer for the parts of the system that are easiest to
//! get exactly right and to test in isolation.

pub mod chain;
pub mod decode;
pub mod error;
pub mod event_signatures;
pub mod types;

pub use chain::{ChainConfig, ChainName, NodeFamily, TxSubscriptionStrategy};
pub use decode::{decode_arbitrum_frame, decode_evm_tx};
pub use error::{ConfigError, DecodeError};
pub use event_signatures::{event_signatures, is_known_signature};
pub use types::{BlockHeader, EventLog, TransactionRecord};
