//! Error types shared by the decoding and configuration layers.

/// Errors that can occur while decoding a raw transaction or sequencer frame.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The payload was empty where at least one byte was expected.
    #[error("empty transaction payload")]
    EmptyPayload,
    /// RLP decoding of a legacy or typed envelope failed.
    #[error("rlp decode error: {0}")]
    Rlp(#[from] rlp::DecoderError),
    /// The typed transaction carried an envelope type we don't know how to decode.
    #[error("unsupported transaction type: 0x{0:02x}")]
    UnsupportedType(u8),
    /// Signature recovery failed (malformed r/s/v or secp256k1 rejected the point).
    #[error("signature recovery failed: {0}")]
    Recovery(#[from] secp256k1::Error),
    /// Base64 decoding of a sequencer frame's `l2Msg` field failed.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    /// A sequencer frame had a `header.kind` other than `3` (L2 message).
    #[error("sequencer frame has unexpected header kind: {0}")]
    UnexpectedFrameKind(u8),
    /// A decoded L2 message had a leading byte other than `4` (signed tx).
    #[error("sequencer L2 message has unexpected type byte: 0x{0:02x}")]
    UnexpectedL2MessageType(u8),
    /// A numeric field did not fit the type it was decoded into.
    #[error("field {0} out of range")]
    FieldOutOfRange(&'static str),
}

/// Errors raised while resolving a chain name to its configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The chain name given on the command line isn't one we know about.
    #[error("invalid chain name: {0}. Please specify a valid chain from the supported list.")]
    InvalidChainName(String),
}
