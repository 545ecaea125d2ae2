//! Error types for the patch engine.

use thiserror::Error;

/// Errors that can occur while validating or applying patches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// The patch is structurally invalid, independent of any document.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),

    /// A replace-style patch under a protocol version that disables it.
    #[error("replace patches are disabled by the active protocol")]
    ReplaceDisabled,

    /// A public key with this id is already present in the document.
    #[error("public key already exists: {0}")]
    DuplicatePublicKey(String),

    /// A service with this id is already present in the document.
    #[error("service already exists: {0}")]
    DuplicateService(String),

    /// The value is not a usable DID document.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// The patch could not be applied to the document.
    #[error("patch application failed: {0}")]
    Apply(String),
}

/// Result type for patch operations.
pub type Result<T> = std::result::Result<T, PatchError>;
