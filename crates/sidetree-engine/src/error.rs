//! Error types for the operation engine.

use sidetree_engine_core::{CoreError, HashAlgorithm};
use sidetree_engine_patch::PatchError;
use thiserror::Error;

/// Errors that can occur while building, validating or replaying operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Content addressing, canonicalization or registry error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Patch validation or application error.
    #[error("patch error: {0}")]
    Patch(#[from] PatchError),

    /// A create or recover document exceeds the delta size limit.
    #[error("document is {size} bytes, limit is {max}")]
    DocumentTooLarge { size: usize, max: usize },

    /// The patches of one operation exceed the delta size limit.
    #[error("patches are {size} bytes, limit is {max}")]
    BatchLimitExceeded { size: usize, max: usize },

    /// The reveal value does not hash to the current commitment.
    #[error("reveal value does not match the current commitment")]
    InvalidReveal,

    /// The DID has been revoked.
    #[error("DID is revoked")]
    Revoked,

    /// No valid create operation exists for the DID.
    #[error("DID not found")]
    NotFound,

    /// A DID string that is not `<namespace>:<suffix>` for this engine.
    #[error("invalid DID: {0}")]
    InvalidDid(String),

    /// An operation names a different DID than the one being processed.
    #[error("operation targets {actual}, expected {expected}")]
    SuffixMismatch { expected: String, actual: String },

    /// A commitment or hash uses a different algorithm than the DID pins.
    #[error("algorithm mismatch: DID uses {expected}, got {actual}")]
    AlgorithmMismatch {
        expected: HashAlgorithm,
        actual: HashAlgorithm,
    },

    /// The create delta does not hash to the `deltaHash` in its suffix data.
    #[error("delta hash does not match suffix data")]
    DeltaHashMismatch,

    /// The operation payload cannot be decoded or sealed.
    #[error("malformed operation: {0}")]
    MalformedOperation(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
