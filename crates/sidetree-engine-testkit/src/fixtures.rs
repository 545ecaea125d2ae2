//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use sidetree_engine::{
    AnchoredOperation, DidState, Engine, EngineError, Operation, Resolution, Result,
};
use sidetree_engine_core::{Commitment, HashAlgorithm, Keypair, RevealValue, UniqueSuffix};
use sidetree_engine_patch::{Document, Patch};

/// Reveal value templates used by the reference scenarios.
pub const RECOVERY_REVEAL: &str = "recoveryOTP";
pub const UPDATE_REVEAL: &str = "updateOTP";

/// Public key material used by [`add_key_patch`].
pub const TEST_PUBLIC_KEY_HEX: &str =
    "02b97c30de767f084ce3080168ee293053ba33b235d7116a3263d29f1450936b71";

/// An `add-public-keys` patch adding one secp256k1 key with `ops` usage.
pub fn add_key_patch(id: &str) -> Patch {
    let keys = serde_json::json!([{
        "id": id,
        "usage": ["ops"],
        "type": "Secp256k1VerificationKey2018",
        "publicKeyHex": TEST_PUBLIC_KEY_HEX,
    }]);
    match Patch::add_public_keys(&keys.to_string()) {
        Ok(patch) => patch,
        Err(e) => panic!("invalid key id {:?}: {}", id, e),
    }
}

/// A `remove-public-keys` patch.
pub fn remove_key_patch(id: &str) -> Patch {
    let ids = serde_json::json!([id]);
    match Patch::remove_public_keys(&ids.to_string()) {
        Ok(patch) => patch,
        Err(e) => panic!("invalid key id {:?}: {}", id, e),
    }
}

/// A DID under test: an engine, the reveal values the controller holds and
/// the anchored history.
///
/// Every operation is anchored one time unit after the previous one.
pub struct TestFixture {
    pub engine: Engine,
    pub history: Vec<AnchoredOperation>,
    suffix: Option<UniqueSuffix>,
    recovery: RevealValue,
    update: RevealValue,
    rotations: u32,
    sealer: Option<Keypair>,
}

impl TestFixture {
    /// Create a fixture over the default engine.
    pub fn new() -> Self {
        Self::with_engine(Engine::default())
    }

    /// Create a fixture over a configured engine.
    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            history: Vec::new(),
            suffix: None,
            recovery: RevealValue::new(RECOVERY_REVEAL),
            update: RevealValue::new(UPDATE_REVEAL),
            rotations: 0,
            sealer: None,
        }
    }

    /// Seal every update, recover and revoke with a deterministic keypair.
    pub fn sealed_with(mut self, seed: [u8; 32]) -> Self {
        self.sealer = Some(Keypair::from_seed(&seed));
        self
    }

    /// The DID suffix, once created.
    pub fn suffix(&self) -> Option<&UniqueSuffix> {
        self.suffix.as_ref()
    }

    fn algorithm(&self) -> Result<HashAlgorithm> {
        Ok(self.engine.current_protocol().hash_algorithm()?)
    }

    fn next_reveal(&mut self, label: &str) -> RevealValue {
        self.rotations += 1;
        RevealValue::new(format!("{}-{}", label, self.rotations))
    }

    fn commitment(&self, reveal: &RevealValue) -> Result<Commitment> {
        Ok(reveal.commitment(self.algorithm()?))
    }

    /// Build and anchor a create operation for `document`.
    pub fn create(&mut self, document: &str) -> Result<UniqueSuffix> {
        let document = Document::from_json(document)?;
        let op = self.engine.build_create(
            document,
            self.commitment(&self.recovery)?,
            self.commitment(&self.update)?,
        )?;
        let suffix = op.did_suffix()?;
        self.anchor(op);
        self.suffix = Some(suffix.clone());
        Ok(suffix)
    }

    /// Build and anchor an update, rotating the update reveal value.
    pub fn update(&mut self, patches: Vec<Patch>) -> Result<()> {
        let state = self.state()?;
        let next = self.next_reveal(UPDATE_REVEAL);
        let op = self.engine.build_update(
            &state,
            &self.update,
            patches,
            self.commitment(&next)?,
        )?;
        self.anchor_sealed(op)?;
        self.update = next;
        Ok(())
    }

    /// Build and anchor a recover, rotating both reveal values.
    pub fn recover(&mut self, document: &str, patches: Vec<Patch>) -> Result<()> {
        let state = self.state()?;
        let next_recovery = self.next_reveal(RECOVERY_REVEAL);
        let next_update = self.next_reveal(UPDATE_REVEAL);
        let op = self.engine.build_recover(
            &state,
            &self.recovery,
            Document::from_json(document)?,
            patches,
            self.commitment(&next_recovery)?,
            self.commitment(&next_update)?,
        )?;
        self.anchor_sealed(op)?;
        self.recovery = next_recovery;
        self.update = next_update;
        Ok(())
    }

    /// Build and anchor a revoke.
    pub fn revoke(&mut self) -> Result<()> {
        let state = self.state()?;
        let op = self.engine.build_revoke(&state, &self.recovery)?;
        self.anchor_sealed(op)
    }

    /// Anchor an operation as-is, one time unit after the last one.
    pub fn anchor(&mut self, op: Operation) {
        let anchor_time = self.history.last().map_or(1, |last| last.anchor_time + 1);
        self.history.push(AnchoredOperation::new(anchor_time, op));
    }

    fn anchor_sealed(&mut self, op: Operation) -> Result<()> {
        let op = match &self.sealer {
            Some(keypair) => op.sign(keypair)?,
            None => op,
        };
        self.anchor(op);
        Ok(())
    }

    /// Resolve the DID from the history.
    pub fn resolve(&self) -> Result<Resolution> {
        let suffix = self.suffix.as_ref().ok_or(EngineError::NotFound)?;
        self.engine.resolve(suffix, &self.history)
    }

    /// The resolved state.
    pub fn state(&self) -> Result<DidState> {
        Ok(self.resolve()?.state)
    }

    /// The resolved document, failing for revoked DIDs.
    pub fn document(&self) -> Result<Document> {
        let suffix = self.suffix.as_ref().ok_or(EngineError::NotFound)?;
        self.engine.resolve_document(suffix, &self.history)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create several fixtures whose DIDs differ by their initial document.
pub fn multi_did_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut fixture = TestFixture::new();
            let document = serde_json::json!({ "publicKeys": [], "name": format!("did-{}", i) });
            if let Err(e) = fixture.create(&document.to_string()) {
                panic!("fixture {} failed to create: {}", i, e);
            }
            fixture
        })
        .collect()
}
