//! Operation validation against a DID state and a protocol version.
//!
//! The builders and the replay fold share these checks, so an operation that
//! builds cleanly against a state is exactly one that replay would accept
//! on top of that state (seal aside).

use sidetree_engine_core::{
    canonical_hash, canonical_len, Commitment, HashAlgorithm, ProtocolParameters, RevealValue,
    UniqueSuffix,
};
use sidetree_engine_patch::{apply_patches, validate_patches, Document, Patch};

use crate::error::{EngineError, Result};
use crate::operation::{CreateOperation, RecoverOperation, RevokeOperation, UpdateOperation};
use crate::state::DidState;

/// Validate a create operation under the given algorithm.
///
/// `deltaHash` covers the whole create delta, `{document, updateCommitment}`,
/// not the initial document alone. Sidetree nodes compute the create delta
/// hash this way, so suffixes stay compatible with theirs and the first
/// update commitment is bound into the suffix.
///
/// This performs:
/// - Algorithm check of `deltaHash` and both commitments
/// - Delta hash verification
/// - Document size check
pub fn validate_create(
    params: &ProtocolParameters,
    op: &CreateOperation,
    algorithm: HashAlgorithm,
) -> Result<()> {
    // 1. Everything in the create is addressed with the suffix algorithm
    check_algorithm(op.suffix_data.delta_hash.algorithm(), algorithm)?;
    check_algorithm(op.suffix_data.recovery_commitment.algorithm(), algorithm)?;
    check_algorithm(op.delta.update_commitment.algorithm(), algorithm)?;

    // 2. deltaHash binds the document and first update commitment
    if canonical_hash(&op.delta, algorithm)? != op.suffix_data.delta_hash {
        return Err(EngineError::DeltaHashMismatch);
    }

    // 3. Size
    check_document_size(params, &op.delta.document)
}

/// Validate an update against the current state and return the new document.
pub fn validate_update(
    params: &ProtocolParameters,
    state: &DidState,
    op: &UpdateOperation,
) -> Result<Document> {
    check_target(state, &op.did_suffix)?;
    check_reveal(&state.update_commitment, &op.reveal_value, state.algorithm)?;
    check_algorithm(op.delta.update_commitment.algorithm(), state.algorithm)?;
    apply_delta(params, &state.document, &op.delta.patches)
}

/// Validate a recover against the current state and return the new document.
///
/// The patches apply on top of `newDocument`, not the current document.
pub fn validate_recover(
    params: &ProtocolParameters,
    state: &DidState,
    op: &RecoverOperation,
) -> Result<Document> {
    check_target(state, &op.did_suffix)?;
    check_reveal(&state.recovery_commitment, &op.reveal_value, state.algorithm)?;
    check_algorithm(op.recovery_commitment.algorithm(), state.algorithm)?;
    check_algorithm(op.delta.update_commitment.algorithm(), state.algorithm)?;
    check_document_size(params, &op.new_document)?;
    apply_delta(params, &op.new_document, &op.delta.patches)
}

/// Validate a revoke against the current state.
pub fn validate_revoke(state: &DidState, op: &RevokeOperation) -> Result<()> {
    check_target(state, &op.did_suffix)?;
    check_reveal(&state.recovery_commitment, &op.reveal_value, state.algorithm)
}

/// Apply patches to `base` under the size and feature rules of `params`.
///
/// The result is a fresh document; `base` is never touched.
pub fn apply_delta(
    params: &ProtocolParameters,
    base: &Document,
    patches: &[Patch],
) -> Result<Document> {
    let size = canonical_len(patches)?;
    if size > params.max_delta_byte_size {
        return Err(EngineError::BatchLimitExceeded {
            size,
            max: params.max_delta_byte_size,
        });
    }

    validate_patches(patches, params)?;
    Ok(apply_patches(base, patches)?)
}

pub fn check_document_size(params: &ProtocolParameters, document: &Document) -> Result<()> {
    let size = canonical_len(document)?;
    if size > params.max_delta_byte_size {
        return Err(EngineError::DocumentTooLarge {
            size,
            max: params.max_delta_byte_size,
        });
    }
    Ok(())
}

/// Exact match of the reveal value's hash against the commitment.
pub fn check_reveal(
    commitment: &Commitment,
    reveal: &RevealValue,
    algorithm: HashAlgorithm,
) -> Result<()> {
    if commitment.is_revealed_by(reveal, algorithm) {
        Ok(())
    } else {
        Err(EngineError::InvalidReveal)
    }
}

pub fn check_algorithm(actual: HashAlgorithm, expected: HashAlgorithm) -> Result<()> {
    if actual != expected {
        return Err(EngineError::AlgorithmMismatch { expected, actual });
    }
    Ok(())
}

fn check_target(state: &DidState, suffix: &UniqueSuffix) -> Result<()> {
    if state.is_revoked() {
        return Err(EngineError::Revoked);
    }
    if &state.suffix != suffix {
        return Err(EngineError::SuffixMismatch {
            expected: state.suffix.to_string(),
            actual: suffix.to_string(),
        });
    }
    Ok(())
}
