//! Replay of anchored operations into a DID state.
//!
//! Resolution is a pure fold over operations in anchoring-time order. Each
//! operation is validated under the protocol version active at its own
//! anchor time.
//!
//! ## Replay policy
//!
//! - The first valid create whose derived suffix matches starts the fold.
//!   Creates for other suffixes and later creates are ignored.
//! - An operation whose reveal value does not match the current chain is
//!   skipped without being reported. A later operation at the same chain
//!   position may still apply.
//! - Any other invalid operation is skipped and reported in
//!   [`Resolution::rejected`].
//! - Once a revoke applies, everything after it is skipped.
//! - An anchor time no protocol version covers aborts the whole resolution.

use tracing::{debug, trace, warn};

use sidetree_engine_core::{
    HashAlgorithm, ProtocolParameters, ProtocolRegistry, SignatureVerifier, UniqueSuffix,
};

use crate::error::{EngineError, Result};
use crate::operation::{CreateOperation, Operation};
use crate::state::{DidState, Lifecycle};
use crate::validation::{validate_create, validate_recover, validate_revoke, validate_update};

/// An operation with the time it was anchored at.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchoredOperation {
    pub anchor_time: u64,
    pub operation: Operation,
}

impl AnchoredOperation {
    pub fn new(anchor_time: u64, operation: Operation) -> Self {
        Self {
            anchor_time,
            operation,
        }
    }
}

/// An operation skipped during replay, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOperation {
    /// Position in the input list.
    pub index: usize,
    pub anchor_time: u64,
    /// Operation kind (`create`, `update`, ...).
    pub kind: &'static str,
    pub error: EngineError,
}

/// The outcome of replaying a DID's operations.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub state: DidState,
    pub rejected: Vec<RejectedOperation>,
}

/// Replays operations for one DID.
pub struct Resolver<'a> {
    registry: &'a ProtocolRegistry,
    verifier: &'a dyn SignatureVerifier,
    namespace: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(
        registry: &'a ProtocolRegistry,
        verifier: &'a dyn SignatureVerifier,
        namespace: &'a str,
    ) -> Self {
        Self {
            registry,
            verifier,
            namespace,
        }
    }

    /// Fold `operations` into the state of `suffix`.
    ///
    /// Operations are taken in anchoring-time order; ties keep input order.
    /// The returned document carries `id = "<namespace>:<suffix>"`.
    pub fn resolve(
        &self,
        suffix: &UniqueSuffix,
        operations: &[AnchoredOperation],
    ) -> Result<Resolution> {
        let algorithm = suffix.algorithm()?;

        let mut ordered: Vec<(usize, &AnchoredOperation)> =
            operations.iter().enumerate().collect();
        ordered.sort_by_key(|(_, op)| op.anchor_time);

        let mut state: Option<DidState> = None;
        let mut rejected = Vec::new();

        for (index, anchored) in ordered {
            let op = &anchored.operation;

            let Some(current) = state.as_mut() else {
                let Operation::Create(create) = op else {
                    trace!(index, kind = op.kind(), "operation before create skipped");
                    continue;
                };
                match create.unique_suffix() {
                    Ok(derived) if &derived == suffix => {}
                    _ => continue,
                }

                let params = self.registry.resolve(anchored.anchor_time)?;
                match validate_create(params, create, algorithm) {
                    Ok(()) => {
                        debug!(
                            index,
                            suffix = %suffix,
                            anchor_time = anchored.anchor_time,
                            "applied create"
                        );
                        state = Some(initial_state(suffix, algorithm, create, anchored.anchor_time));
                    }
                    Err(error) => reject(&mut rejected, index, anchored, error),
                }
                continue;
            };

            if current.is_revoked() {
                trace!(index, kind = op.kind(), "operation after revoke skipped");
                continue;
            }

            match op {
                Operation::Create(_) => {
                    trace!(index, "repeated create ignored");
                    continue;
                }
                other => match other.did_suffix() {
                    Ok(target) if &target == suffix => {}
                    _ => continue,
                },
            }

            let params = self.registry.resolve(anchored.anchor_time)?;
            match self.step(params, current, op) {
                Ok(next) => {
                    *current = next;
                    current.advance(anchored.anchor_time);
                    debug!(
                        index,
                        kind = op.kind(),
                        suffix = %suffix,
                        anchor_time = anchored.anchor_time,
                        "applied operation"
                    );
                }
                Err(EngineError::InvalidReveal) => {
                    trace!(index, kind = op.kind(), "reveal mismatch, operation skipped");
                }
                Err(error) => reject(&mut rejected, index, anchored, error),
            }
        }

        let mut state = state.ok_or(EngineError::NotFound)?;
        let did = state.did(self.namespace);
        state.document.set_id(did);
        Ok(Resolution { state, rejected })
    }

    /// The state an unanchored create implies.
    ///
    /// The create is validated under the current protocol version and must
    /// derive `suffix`.
    pub fn resolve_unpublished(
        &self,
        suffix: &UniqueSuffix,
        create: &CreateOperation,
    ) -> Result<Resolution> {
        let derived = create.unique_suffix()?;
        if &derived != suffix {
            return Err(EngineError::SuffixMismatch {
                expected: suffix.to_string(),
                actual: derived.to_string(),
            });
        }

        let algorithm = suffix.algorithm()?;
        validate_create(self.registry.current(), create, algorithm)?;

        let mut state = initial_state(suffix, algorithm, create, 0);
        let did = state.did(self.namespace);
        state.document.set_id(did);
        debug!(suffix = %suffix, "resolved from initial values");
        Ok(Resolution {
            state,
            rejected: Vec::new(),
        })
    }

    /// Validate one non-create operation and compute the successor state.
    fn step(
        &self,
        params: &ProtocolParameters,
        current: &DidState,
        op: &Operation,
    ) -> Result<DidState> {
        let mut next = current.clone();
        match op {
            Operation::Update(update) => {
                next.document = validate_update(params, current, update)?;
                op.verify_seal(self.verifier)?;
                next.update_commitment = update.delta.update_commitment.clone();
            }
            Operation::Recover(recover) => {
                next.document = validate_recover(params, current, recover)?;
                op.verify_seal(self.verifier)?;
                next.recovery_commitment = recover.recovery_commitment.clone();
                next.update_commitment = recover.delta.update_commitment.clone();
            }
            Operation::Revoke(revoke) => {
                validate_revoke(current, revoke)?;
                op.verify_seal(self.verifier)?;
                next.lifecycle = Lifecycle::Revoked;
            }
            Operation::Create(_) => {
                return Err(EngineError::MalformedOperation(
                    "create cannot follow a published state".into(),
                ))
            }
        }
        Ok(next)
    }
}

fn initial_state(
    suffix: &UniqueSuffix,
    algorithm: HashAlgorithm,
    create: &CreateOperation,
    anchor_time: u64,
) -> DidState {
    DidState {
        suffix: suffix.clone(),
        algorithm,
        document: create.delta.document.clone(),
        recovery_commitment: create.suffix_data.recovery_commitment.clone(),
        update_commitment: create.delta.update_commitment.clone(),
        lifecycle: Lifecycle::Published,
        last_anchor_time: anchor_time,
        applied_operations: 1,
    }
}

fn reject(
    rejected: &mut Vec<RejectedOperation>,
    index: usize,
    anchored: &AnchoredOperation,
    error: EngineError,
) {
    warn!(
        index,
        kind = anchored.operation.kind(),
        anchor_time = anchored.anchor_time,
        error = %error,
        "operation rejected during resolution"
    );
    rejected.push(RejectedOperation {
        index,
        anchor_time: anchored.anchor_time,
        kind: anchored.operation.kind(),
        error,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_create, build_revoke, build_update};
    use sidetree_engine_core::{Commitment, CoreError, Ed25519Verifier, Keypair, RevealValue};
    use sidetree_engine_patch::{Document, Patch};

    const ALG: HashAlgorithm = HashAlgorithm::Sha2_256;
    const NS: &str = "did:sidetree";

    fn commit(s: &str) -> Commitment {
        RevealValue::new(s).commitment(ALG)
    }

    fn add_key(id: &str) -> Patch {
        Patch::add_public_keys(&format!(
            r#"[{{"id":"{}","usage":["ops"],"type":"Secp256k1VerificationKey2018","publicKeyHex":"02"}}]"#,
            id
        ))
        .unwrap()
    }

    fn create() -> (UniqueSuffix, AnchoredOperation) {
        let params = ProtocolParameters::default();
        let doc = Document::from_json(r#"{"id":"","publicKeys":[]}"#).unwrap();
        let op = build_create(&params, 18, doc, commit("recoveryOTP"), commit("updateOTP")).unwrap();
        (op.did_suffix().unwrap(), AnchoredOperation::new(1, op))
    }

    fn resolve_with(
        registry: &ProtocolRegistry,
        suffix: &UniqueSuffix,
        ops: &[AnchoredOperation],
    ) -> Result<Resolution> {
        Resolver::new(registry, &Ed25519Verifier, NS).resolve(suffix, ops)
    }

    fn resolve(suffix: &UniqueSuffix, ops: &[AnchoredOperation]) -> Result<Resolution> {
        resolve_with(&ProtocolRegistry::default(), suffix, ops)
    }

    #[test]
    fn test_create_only() {
        let (suffix, create) = create();
        let resolution = resolve(&suffix, &[create]).unwrap();
        let expected = Document::from_json(r#"{"publicKeys":[]}"#)
            .unwrap()
            .with_id(format!("{}:{}", NS, suffix));
        assert_eq!(resolution.state.document, expected);
        assert_eq!(resolution.state.applied_operations, 1);
        assert!(resolution.rejected.is_empty());
    }

    #[test]
    fn test_not_found() {
        let (suffix, _) = create();
        assert_eq!(resolve(&suffix, &[]), Err(EngineError::NotFound));
    }

    #[test]
    fn test_update_before_create_is_skipped() {
        let (suffix, create) = create();
        let state = resolve(&suffix, &[create.clone()]).unwrap().state;
        let update = build_update(
            &ProtocolParameters::default(),
            &state,
            &RevealValue::new("updateOTP"),
            vec![add_key("k1")],
            commit("u2"),
        )
        .unwrap();

        let ops = [AnchoredOperation::new(0, update), create];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert!(resolution.state.document.public_key_ids().is_empty());
    }

    #[test]
    fn test_input_sorted_by_anchor_time() {
        let (suffix, create) = create();
        let state = resolve(&suffix, &[create.clone()]).unwrap().state;
        let update = build_update(
            &ProtocolParameters::default(),
            &state,
            &RevealValue::new("updateOTP"),
            vec![add_key("k1")],
            commit("u2"),
        )
        .unwrap();

        let ops = [AnchoredOperation::new(5, update), create];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert_eq!(resolution.state.document.public_key_ids(), vec!["k1"]);
        assert_eq!(resolution.state.last_anchor_time, 5);
    }

    #[test]
    fn test_reveal_mismatch_is_skipped_silently() {
        let (suffix, create) = create();
        let state = resolve(&suffix, &[create.clone()]).unwrap().state;
        let params = ProtocolParameters::default();

        let first = build_update(
            &params,
            &state,
            &RevealValue::new("updateOTP"),
            vec![add_key("k1")],
            commit("u2"),
        )
        .unwrap();
        let replay = build_update(
            &params,
            &state,
            &RevealValue::new("updateOTP"),
            vec![add_key("k2")],
            commit("u3"),
        )
        .unwrap();

        let ops = [
            create,
            AnchoredOperation::new(2, first),
            AnchoredOperation::new(3, replay),
        ];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert_eq!(resolution.state.document.public_key_ids(), vec!["k1"]);
        assert!(resolution.rejected.is_empty());
    }

    #[test]
    fn test_other_failures_are_reported() {
        let (suffix, create) = create();
        let state = resolve(&suffix, &[create.clone()]).unwrap().state;

        let update = build_update(
            &ProtocolParameters::default(),
            &state,
            &RevealValue::new("updateOTP"),
            vec![Patch::replace(Document::new())],
            commit("u2"),
        )
        .unwrap();

        // replace patches are disabled from anchor time 10 on
        let registry = ProtocolRegistry::new(vec![
            ProtocolParameters::default(),
            ProtocolParameters {
                enable_replace_patch: false,
                ..ProtocolParameters::default()
            }
            .starting_at(10),
        ])
        .unwrap();

        let ops = [create, AnchoredOperation::new(10, update)];
        let resolution = resolve_with(&registry, &suffix, &ops).unwrap();
        assert_eq!(resolution.rejected.len(), 1);
        assert_eq!(resolution.rejected[0].index, 1);
        assert_eq!(resolution.rejected[0].kind, "update");
        assert_eq!(
            resolution.rejected[0].error,
            EngineError::Patch(sidetree_engine_patch::PatchError::ReplaceDisabled)
        );
        assert_eq!(resolution.state.applied_operations, 1);
    }

    #[test]
    fn test_no_applicable_protocol_aborts() {
        let (suffix, create) = create();
        let registry =
            ProtocolRegistry::new(vec![ProtocolParameters::default().starting_at(100)]).unwrap();
        assert_eq!(
            resolve_with(&registry, &suffix, &[create]),
            Err(EngineError::Core(CoreError::NoApplicableProtocol {
                anchor_time: 1
            }))
        );
    }

    #[test]
    fn test_bad_seal_is_rejected() {
        let (suffix, create) = create();
        let state = resolve(&suffix, &[create.clone()]).unwrap().state;
        let revoke = build_revoke(&state, &RevealValue::new("recoveryOTP"))
            .unwrap()
            .sign(&Keypair::from_seed(&[4; 32]))
            .unwrap();

        let Operation::Revoke(mut forged) = revoke else {
            panic!("expected revoke");
        };
        if let Some(signed) = forged.signed_data.as_mut() {
            signed.signature[0] ^= 0xff;
        }

        let ops = [create, AnchoredOperation::new(2, Operation::Revoke(forged))];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert!(!resolution.state.is_revoked());
        assert_eq!(
            resolution.rejected[0].error,
            EngineError::Core(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_duplicate_create_ignored() {
        let (suffix, create) = create();
        let ops = [create.clone(), AnchoredOperation::new(2, create.operation)];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert_eq!(resolution.state.applied_operations, 1);
        assert_eq!(resolution.state.last_anchor_time, 1);
    }

    #[test]
    fn test_tampered_create_is_reported() {
        let (suffix, create) = create();
        let Operation::Create(mut tampered) = create.operation.clone() else {
            panic!("expected create");
        };
        tampered.delta.document = Document::from_json(r#"{"evil":true}"#).unwrap();

        let ops = [
            AnchoredOperation::new(1, Operation::Create(tampered)),
            AnchoredOperation::new(2, create.operation),
        ];
        let resolution = resolve(&suffix, &ops).unwrap();
        assert_eq!(resolution.rejected[0].error, EngineError::DeltaHashMismatch);
        assert_eq!(resolution.state.last_anchor_time, 2);
        assert!(resolution.state.document.get("evil").is_none());
    }

    #[test]
    fn test_resolve_unpublished() {
        let (suffix, anchored) = create();
        let Operation::Create(op) = anchored.operation else {
            panic!("expected create");
        };
        let registry = ProtocolRegistry::default();
        let resolver = Resolver::new(&registry, &Ed25519Verifier, NS);

        let resolution = resolver.resolve_unpublished(&suffix, &op).unwrap();
        let did = format!("{}:{}", NS, suffix);
        assert_eq!(resolution.state.document.id(), Some(did.as_str()));
        assert_eq!(resolution.state.update_commitment, commit("updateOTP"));
        assert_eq!(resolution.state.last_anchor_time, 0);
    }

    #[test]
    fn test_resolve_unpublished_wrong_suffix() {
        let (_, anchored) = create();
        let Operation::Create(op) = anchored.operation else {
            panic!("expected create");
        };
        let other = build_create(
            &ProtocolParameters::default(),
            18,
            Document::new(),
            commit("r"),
            commit("u"),
        )
        .unwrap()
        .did_suffix()
        .unwrap();

        let registry = ProtocolRegistry::default();
        let resolver = Resolver::new(&registry, &Ed25519Verifier, NS);
        assert!(matches!(
            resolver.resolve_unpublished(&other, &op),
            Err(EngineError::SuffixMismatch { .. })
        ));
    }
}
