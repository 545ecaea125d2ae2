//! Operation builders.
//!
//! Each builder assembles an operation, then runs the same validation the
//! replay fold applies against the given state. A builder either returns a
//! complete operation or an error; there is no partially built result.

use tracing::debug;

use sidetree_engine_core::{
    canonical_hash, Commitment, HashAlgorithm, ProtocolParameters, RevealValue,
};
use sidetree_engine_patch::{Document, Patch};

use crate::error::{EngineError, Result};
use crate::operation::{
    CreateDelta, CreateOperation, Delta, Operation, RecoverOperation, RevokeOperation, SuffixData,
    UpdateOperation,
};
use crate::state::DidState;
use crate::validation::{
    check_algorithm, validate_create, validate_recover, validate_revoke, validate_update,
};

/// Build a create operation.
///
/// The suffix is derived from `{deltaHash, recoveryCommitment}` under
/// `algorithm_code`, which is pinned for the DID's lifetime. Both
/// commitments must already use that algorithm.
pub fn build_create(
    params: &ProtocolParameters,
    algorithm_code: u64,
    document: Document,
    recovery_commitment: Commitment,
    update_commitment: Commitment,
) -> Result<Operation> {
    let algorithm = HashAlgorithm::from_code(algorithm_code)?;
    check_algorithm(recovery_commitment.algorithm(), algorithm)?;
    check_algorithm(update_commitment.algorithm(), algorithm)?;

    let delta = CreateDelta {
        document,
        update_commitment,
    };
    let op = CreateOperation {
        suffix_data: SuffixData {
            delta_hash: canonical_hash(&delta, algorithm)?,
            recovery_commitment,
        },
        delta,
    };

    validate_create(params, &op, algorithm)?;

    let suffix = op.unique_suffix()?;
    debug!(suffix = %suffix, %algorithm, "built create operation");
    Ok(Operation::Create(op))
}

/// Build an update operation against the current state.
///
/// `reveal` must be the pre-image of the state's update commitment.
pub fn build_update(
    params: &ProtocolParameters,
    state: &DidState,
    reveal: &RevealValue,
    patches: Vec<Patch>,
    next_update_commitment: Commitment,
) -> Result<Operation> {
    if next_update_commitment == state.update_commitment {
        debug!(suffix = %state.suffix, "next update commitment repeats the revealed one");
    }

    let op = UpdateOperation {
        did_suffix: state.suffix.clone(),
        reveal_value: reveal.clone(),
        delta: Delta {
            patches,
            update_commitment: next_update_commitment,
        },
        signed_data: None,
    };

    validate_update(params, state, &op)?;

    debug!(
        suffix = %state.suffix,
        patches = op.delta.patches.len(),
        "built update operation"
    );
    Ok(Operation::Update(op))
}

/// Build a recover operation against the current state.
///
/// `reveal` must be the pre-image of the state's recovery commitment. Both
/// chains restart from the new commitments.
pub fn build_recover(
    params: &ProtocolParameters,
    state: &DidState,
    reveal: &RevealValue,
    new_document: Document,
    patches: Vec<Patch>,
    next_recovery_commitment: Commitment,
    next_update_commitment: Commitment,
) -> Result<Operation> {
    if next_recovery_commitment == state.recovery_commitment {
        debug!(suffix = %state.suffix, "next recovery commitment repeats the revealed one");
    }

    let op = RecoverOperation {
        did_suffix: state.suffix.clone(),
        reveal_value: reveal.clone(),
        recovery_commitment: next_recovery_commitment,
        new_document,
        delta: Delta {
            patches,
            update_commitment: next_update_commitment,
        },
        signed_data: None,
    };

    validate_recover(params, state, &op)?;

    debug!(suffix = %state.suffix, "built recover operation");
    Ok(Operation::Recover(op))
}

/// Build a revoke operation against the current state.
pub fn build_revoke(state: &DidState, reveal: &RevealValue) -> Result<Operation> {
    let op = RevokeOperation {
        did_suffix: state.suffix.clone(),
        reveal_value: reveal.clone(),
        signed_data: None,
    };

    validate_revoke(state, &op)?;

    debug!(suffix = %state.suffix, "built revoke operation");
    Ok(Operation::Revoke(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Lifecycle;
    use sidetree_engine_core::CoreError;

    const ALG: HashAlgorithm = HashAlgorithm::Sha2_256;
    const ADD_K1: &str = r#"[{"id":"k1","usage":["ops"],"type":"Secp256k1VerificationKey2018","publicKeyHex":"02b9"}]"#;

    fn reveal(s: &str) -> RevealValue {
        RevealValue::new(s)
    }

    fn commit(s: &str) -> Commitment {
        reveal(s).commitment(ALG)
    }

    fn published() -> DidState {
        let params = ProtocolParameters::default();
        let doc = Document::from_json(r#"{"id":"","publicKeys":[]}"#).unwrap();
        let Operation::Create(op) =
            build_create(&params, 18, doc.clone(), commit("recoveryOTP"), commit("updateOTP"))
                .unwrap()
        else {
            panic!("expected create");
        };
        DidState {
            suffix: op.unique_suffix().unwrap(),
            algorithm: ALG,
            document: doc,
            recovery_commitment: commit("recoveryOTP"),
            update_commitment: commit("updateOTP"),
            lifecycle: Lifecycle::Published,
            last_anchor_time: 0,
            applied_operations: 1,
        }
    }

    #[test]
    fn test_build_create_unknown_algorithm() {
        let params = ProtocolParameters::default();
        assert_eq!(
            build_create(&params, 0x99, Document::new(), commit("a"), commit("b")),
            Err(EngineError::Core(CoreError::UnsupportedAlgorithm(0x99)))
        );
    }

    #[test]
    fn test_build_create_commitment_algorithm_must_match() {
        let params = ProtocolParameters::default();
        let blake = reveal("a").commitment(HashAlgorithm::Blake3_256);
        assert!(matches!(
            build_create(&params, 18, Document::new(), blake, commit("b")),
            Err(EngineError::AlgorithmMismatch { .. })
        ));
    }

    #[test]
    fn test_build_create_too_large() {
        let params = ProtocolParameters {
            max_delta_byte_size: 10,
            ..ProtocolParameters::default()
        };
        let doc = Document::from_json(r#"{"service":[],"publicKeys":[]}"#).unwrap();
        assert!(matches!(
            build_create(&params, 18, doc, commit("a"), commit("b")),
            Err(EngineError::DocumentTooLarge { max: 10, .. })
        ));
    }

    #[test]
    fn test_build_update() {
        let params = ProtocolParameters::default();
        let patches = vec![Patch::add_public_keys(ADD_K1).unwrap()];
        let op = build_update(&params, &published(), &reveal("updateOTP"), patches, commit("u2"))
            .unwrap();
        assert_eq!(op.kind(), "update");
        assert_eq!(op.did_suffix().unwrap(), published().suffix);
    }

    #[test]
    fn test_build_update_wrong_reveal() {
        let params = ProtocolParameters::default();
        assert_eq!(
            build_update(&params, &published(), &reveal("wrong"), vec![], commit("u2")),
            Err(EngineError::InvalidReveal)
        );
    }

    #[test]
    fn test_build_update_may_repeat_commitment() {
        let params = ProtocolParameters::default();
        let patches = vec![Patch::add_public_keys(ADD_K1).unwrap()];
        let op = build_update(
            &params,
            &published(),
            &reveal("updateOTP"),
            patches,
            commit("updateOTP"),
        )
        .unwrap();

        let Operation::Update(update) = op else {
            panic!("expected update");
        };
        assert_eq!(update.delta.update_commitment, commit("updateOTP"));
    }

    #[test]
    fn test_build_recover_may_repeat_commitments() {
        let params = ProtocolParameters::default();
        assert!(build_recover(
            &params,
            &published(),
            &reveal("recoveryOTP"),
            Document::new(),
            vec![],
            commit("recoveryOTP"),
            commit("updateOTP"),
        )
        .is_ok());
    }

    #[test]
    fn test_old_reveal_fails_after_commitment_moves() {
        let params = ProtocolParameters::default();
        let mut state = published();
        state.update_commitment = commit("u2");

        assert_eq!(
            build_update(&params, &state, &reveal("updateOTP"), vec![], commit("updateOTP")),
            Err(EngineError::InvalidReveal)
        );
    }

    #[test]
    fn test_build_update_patches_over_limit() {
        let params = ProtocolParameters {
            max_delta_byte_size: 40,
            ..ProtocolParameters::default()
        };
        let patches = vec![Patch::add_public_keys(ADD_K1).unwrap()];
        assert!(matches!(
            build_update(&params, &published(), &reveal("updateOTP"), patches, commit("u2")),
            Err(EngineError::BatchLimitExceeded { max: 40, .. })
        ));
    }

    #[test]
    fn test_build_recover_document_over_limit() {
        let params = ProtocolParameters {
            max_delta_byte_size: 20,
            ..ProtocolParameters::default()
        };
        let doc = Document::from_json(r#"{"service":[],"publicKeys":[]}"#).unwrap();
        assert!(matches!(
            build_recover(
                &params,
                &published(),
                &reveal("recoveryOTP"),
                doc,
                vec![],
                commit("r2"),
                commit("u2"),
            ),
            Err(EngineError::DocumentTooLarge { max: 20, .. })
        ));
    }

    #[test]
    fn test_build_update_json_patch_cannot_smuggle_keys() {
        let params = ProtocolParameters::default();
        let patches = vec![Patch::json_patch(
            r#"[
                {"op":"add","path":"/publicKeys/-","value":{"id":"k1"}},
                {"op":"add","path":"/publicKeys/-","value":{"id":"k1","usage":["bogus"]}}
            ]"#,
        )
        .unwrap()];
        assert!(matches!(
            build_update(&params, &published(), &reveal("updateOTP"), patches, commit("u2")),
            Err(EngineError::Patch(_))
        ));
    }

    #[test]
    fn test_build_update_dry_run_catches_duplicate_key() {
        let params = ProtocolParameters::default();
        let patches = vec![
            Patch::add_public_keys(ADD_K1).unwrap(),
            Patch::add_public_keys(ADD_K1).unwrap(),
        ];
        assert!(matches!(
            build_update(&params, &published(), &reveal("updateOTP"), patches, commit("u2")),
            Err(EngineError::Patch(_))
        ));
    }

    #[test]
    fn test_build_recover_and_revoke_use_recovery_chain() {
        let params = ProtocolParameters::default();
        let state = published();

        assert_eq!(
            build_recover(
                &params,
                &state,
                &reveal("updateOTP"),
                Document::new(),
                vec![],
                commit("r2"),
                commit("u2"),
            ),
            Err(EngineError::InvalidReveal)
        );
        assert!(build_recover(
            &params,
            &state,
            &reveal("recoveryOTP"),
            Document::new(),
            vec![],
            commit("r2"),
            commit("u2"),
        )
        .is_ok());

        assert_eq!(
            build_revoke(&state, &reveal("updateOTP")),
            Err(EngineError::InvalidReveal)
        );
        assert!(build_revoke(&state, &reveal("recoveryOTP")).is_ok());
    }

    #[test]
    fn test_builders_reject_revoked_state() {
        let params = ProtocolParameters::default();
        let mut state = published();
        state.lifecycle = Lifecycle::Revoked;

        assert_eq!(
            build_update(&params, &state, &reveal("updateOTP"), vec![], commit("u2")),
            Err(EngineError::Revoked)
        );
        assert_eq!(
            build_revoke(&state, &reveal("recoveryOTP")),
            Err(EngineError::Revoked)
        );
    }
}
