//! The Engine: unified API over the registry, builders and resolver.
//!
//! The Engine owns the protocol registry and the signature verifier and
//! holds no other state. Builds use the current protocol version;
//! resolution uses the version active at each operation's anchor time.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use sidetree_engine_core::{
    Commitment, CoreError, Ed25519Verifier, ProtocolParameters, ProtocolRegistry, RevealValue,
    SignatureVerifier, UniqueSuffix,
};
use sidetree_engine_patch::{Document, Patch};

use crate::builder::{build_create, build_recover, build_revoke, build_update};
use crate::error::{EngineError, Result};
use crate::operation::{CreateOperation, Operation};
use crate::resolver::{AnchoredOperation, Resolution, Resolver};
use crate::state::DidState;

/// Default DID namespace.
pub const DEFAULT_NAMESPACE: &str = "did:sidetree";

/// Separates a DID from its encoded create in long form.
pub const INITIAL_VALUES_PARAM: &str = ";initial-values=";

/// Configuration for the Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// DID prefix, e.g. `did:sidetree`.
    pub namespace: String,
    /// Protocol versions, in any order.
    pub protocols: Vec<ProtocolParameters>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            protocols: vec![ProtocolParameters::default()],
        }
    }
}

impl EngineConfig {
    /// Load a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Encoding(e.to_string()).into())
    }
}

/// The main Engine struct.
///
/// Provides a unified API for:
/// - Looking up protocol versions
/// - Building create, update, recover and revoke operations
/// - Resolving a DID from its anchored operations
#[derive(Clone)]
pub struct Engine {
    /// Protocol versions by activation time.
    registry: ProtocolRegistry,
    /// Verifier for operation seals.
    verifier: Arc<dyn SignatureVerifier>,
    /// DID prefix.
    namespace: String,
}

impl Engine {
    /// Create an engine, validating the protocol table.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = ProtocolRegistry::new(config.protocols)?;
        Ok(Self {
            registry,
            verifier: Arc::new(Ed25519Verifier),
            namespace: config.namespace,
        })
    }

    /// Replace the seal verifier.
    pub fn with_verifier(mut self, verifier: impl SignatureVerifier + 'static) -> Self {
        self.verifier = Arc::new(verifier);
        self
    }

    /// The protocol registry.
    pub fn registry(&self) -> &ProtocolRegistry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The full DID for a suffix.
    pub fn did(&self, suffix: &UniqueSuffix) -> String {
        format!("{}:{}", self.namespace, suffix)
    }

    /// Parse `<namespace>:<suffix>` back into a suffix.
    pub fn parse_did(&self, did: &str) -> Result<UniqueSuffix> {
        let suffix = did
            .strip_prefix(self.namespace.as_str())
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| EngineError::InvalidDid(did.to_string()))?;
        UniqueSuffix::parse(suffix).map_err(|_| EngineError::InvalidDid(did.to_string()))
    }

    /// The long form of a DID: `<did>;initial-values=<encoded create>`.
    pub fn long_form_did(&self, create: &CreateOperation) -> Result<String> {
        let suffix = create.unique_suffix()?;
        Ok(format!(
            "{}{}{}",
            self.did(&suffix),
            INITIAL_VALUES_PARAM,
            create.to_initial_values()?
        ))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Protocol Versions
    // ─────────────────────────────────────────────────────────────────────────

    /// The protocol version with the greatest activation time.
    pub fn current_protocol(&self) -> &ProtocolParameters {
        self.registry.current()
    }

    /// The protocol version active at `anchor_time`.
    pub fn protocol_at(&self, anchor_time: u64) -> Result<&ProtocolParameters> {
        Ok(self.registry.resolve(anchor_time)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builders
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a create operation with the current default hash algorithm.
    pub fn build_create(
        &self,
        document: Document,
        recovery_commitment: Commitment,
        update_commitment: Commitment,
    ) -> Result<Operation> {
        let params = self.current_protocol();
        build_create(
            params,
            params.hash_algorithm,
            document,
            recovery_commitment,
            update_commitment,
        )
    }

    /// Build an update operation against a resolved state.
    pub fn build_update(
        &self,
        state: &DidState,
        reveal: &RevealValue,
        patches: Vec<Patch>,
        next_update_commitment: Commitment,
    ) -> Result<Operation> {
        build_update(
            self.current_protocol(),
            state,
            reveal,
            patches,
            next_update_commitment,
        )
    }

    /// Build a recover operation against a resolved state.
    pub fn build_recover(
        &self,
        state: &DidState,
        reveal: &RevealValue,
        new_document: Document,
        patches: Vec<Patch>,
        next_recovery_commitment: Commitment,
        next_update_commitment: Commitment,
    ) -> Result<Operation> {
        build_recover(
            self.current_protocol(),
            state,
            reveal,
            new_document,
            patches,
            next_recovery_commitment,
            next_update_commitment,
        )
    }

    /// Build a revoke operation against a resolved state.
    pub fn build_revoke(&self, state: &DidState, reveal: &RevealValue) -> Result<Operation> {
        build_revoke(state, reveal)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Replay `operations` into the state of `suffix`.
    pub fn resolve(
        &self,
        suffix: &UniqueSuffix,
        operations: &[AnchoredOperation],
    ) -> Result<Resolution> {
        Resolver::new(&self.registry, self.verifier.as_ref(), &self.namespace)
            .resolve(suffix, operations)
    }

    /// Resolve a DID that may not be anchored yet.
    ///
    /// `encoded_create` must derive the suffix of `did`, otherwise this fails
    /// with `SuffixMismatch`. An anchored create in `operations` takes
    /// precedence; without one the state is the one the encoded create
    /// implies under the current protocol version.
    pub fn resolve_with_initial_state(
        &self,
        did: &str,
        encoded_create: &str,
        operations: &[AnchoredOperation],
    ) -> Result<Resolution> {
        let suffix = self.parse_did(did)?;
        let create = CreateOperation::from_initial_values(encoded_create)?;
        let derived = create.unique_suffix()?;
        if derived != suffix {
            return Err(EngineError::SuffixMismatch {
                expected: suffix.to_string(),
                actual: derived.to_string(),
            });
        }

        let resolver = Resolver::new(&self.registry, self.verifier.as_ref(), &self.namespace);
        match resolver.resolve(&suffix, operations) {
            Err(EngineError::NotFound) => resolver.resolve_unpublished(&suffix, &create),
            resolved => resolved,
        }
    }

    /// Resolve a long-form DID (`<did>;initial-values=<encoded create>`).
    pub fn resolve_long_form(
        &self,
        long_form: &str,
        operations: &[AnchoredOperation],
    ) -> Result<Resolution> {
        let (did, encoded_create) = long_form
            .split_once(INITIAL_VALUES_PARAM)
            .ok_or_else(|| EngineError::InvalidDid(long_form.to_string()))?;
        self.resolve_with_initial_state(did, encoded_create, operations)
    }

    /// Resolve to the current document, failing for revoked DIDs.
    pub fn resolve_document(
        &self,
        suffix: &UniqueSuffix,
        operations: &[AnchoredOperation],
    ) -> Result<Document> {
        let resolution = self.resolve(suffix, operations)?;
        if resolution.state.is_revoked() {
            return Err(EngineError::Revoked);
        }
        Ok(resolution.state.document)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            registry: ProtocolRegistry::default(),
            verifier: Arc::new(Ed25519Verifier),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("namespace", &self.namespace)
            .field("versions", &self.registry.versions().len())
            .finish()
    }
}
