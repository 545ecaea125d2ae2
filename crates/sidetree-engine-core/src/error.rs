//! Error types for the Sidetree engine core.

use thiserror::Error;

/// Core errors raised by content addressing, canonicalization and the
/// protocol registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("no protocol version is active at anchor time {anchor_time}")]
    NoApplicableProtocol { anchor_time: u64 },

    #[error("protocol registry has no versions")]
    EmptyRegistry,

    #[error("two protocol versions activate at anchor time {0}")]
    DuplicateActivationTime(u64),

    #[error("unsupported multihash algorithm code: {0:#x}")]
    UnsupportedAlgorithm(u64),

    #[error("malformed multihash: {0}")]
    MalformedMultihash(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
