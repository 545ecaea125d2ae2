//! The operation model and its wire format.
//!
//! An operation is a JSON object tagged by `type`. Its canonical payload is
//! the RFC 8785 encoding of that object, which is what gets anchored, hashed
//! and sealed.
//!
//! ```text
//! create:  {type, suffixData: {deltaHash, recoveryCommitment},
//!           delta: {document, updateCommitment}}
//! update:  {type, didSuffix, revealValue, delta: {patches, updateCommitment}, signedData?}
//! recover: {type, didSuffix, revealValue, recoveryCommitment, newDocument,
//!           delta: {patches, updateCommitment}, signedData?}
//! revoke:  {type, didSuffix, revealValue, signedData?}
//! ```

use serde::{Deserialize, Serialize};

use sidetree_engine_core::multihash::{decode_base64url, encode_base64url};
use sidetree_engine_core::{
    canonicalize, unique_suffix, Commitment, Keypair, Multihash, RevealValue, SignatureVerifier,
    UniqueSuffix,
};
use sidetree_engine_patch::{Document, Patch};

use crate::error::{EngineError, Result};

/// Suffix data of a create operation. Its canonical hash is the DID suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuffixData {
    /// Multihash of the canonical create delta.
    pub delta_hash: Multihash,
    /// First commitment of the recovery chain.
    pub recovery_commitment: Commitment,
}

/// The initial document and first update commitment of a create operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDelta {
    pub document: Document,
    pub update_commitment: Commitment,
}

/// Ordered patches plus the next update commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub patches: Vec<Patch>,
    pub update_commitment: Commitment,
}

/// Integrity seal over the canonical operation without this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedData {
    #[serde(with = "base64url_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64url_bytes")]
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperation {
    pub suffix_data: SuffixData,
    pub delta: CreateDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOperation {
    pub did_suffix: UniqueSuffix,
    pub reveal_value: RevealValue,
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_data: Option<SignedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverOperation {
    pub did_suffix: UniqueSuffix,
    pub reveal_value: RevealValue,
    /// Next commitment of the recovery chain.
    pub recovery_commitment: Commitment,
    pub new_document: Document,
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_data: Option<SignedData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOperation {
    pub did_suffix: UniqueSuffix,
    pub reveal_value: RevealValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_data: Option<SignedData>,
}

/// One of the four operation kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Create(CreateOperation),
    Update(UpdateOperation),
    Recover(RecoverOperation),
    Revoke(RevokeOperation),
}

impl CreateOperation {
    /// Derive the DID suffix from the suffix data.
    ///
    /// The algorithm is the one `deltaHash` was computed with.
    pub fn unique_suffix(&self) -> Result<UniqueSuffix> {
        let algorithm = self.suffix_data.delta_hash.algorithm();
        Ok(unique_suffix(&self.suffix_data, algorithm)?)
    }

    /// Encode as the `initial-values` of a long-form DID: base64url of the
    /// canonical create payload.
    pub fn to_initial_values(&self) -> Result<String> {
        let bytes = Operation::Create(self.clone()).to_bytes()?;
        Ok(encode_base64url(&bytes))
    }

    /// Decode the `initial-values` of a long-form DID.
    pub fn from_initial_values(encoded: &str) -> Result<Self> {
        let bytes = decode_base64url(encoded)?;
        match Operation::from_bytes(&bytes)? {
            Operation::Create(op) => Ok(op),
            other => Err(EngineError::MalformedOperation(format!(
                "initial values hold a {} operation, not a create",
                other.kind()
            ))),
        }
    }
}

impl Operation {
    /// The wire name of this operation kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Create(_) => "create",
            Operation::Update(_) => "update",
            Operation::Recover(_) => "recover",
            Operation::Revoke(_) => "revoke",
        }
    }

    /// The DID this operation targets. Derived for creates, supplied otherwise.
    pub fn did_suffix(&self) -> Result<UniqueSuffix> {
        match self {
            Operation::Create(op) => op.unique_suffix(),
            Operation::Update(op) => Ok(op.did_suffix.clone()),
            Operation::Recover(op) => Ok(op.did_suffix.clone()),
            Operation::Revoke(op) => Ok(op.did_suffix.clone()),
        }
    }

    /// The seal, if the operation carries one.
    pub fn signed_data(&self) -> Option<&SignedData> {
        match self {
            Operation::Create(_) => None,
            Operation::Update(op) => op.signed_data.as_ref(),
            Operation::Recover(op) => op.signed_data.as_ref(),
            Operation::Revoke(op) => op.signed_data.as_ref(),
        }
    }

    fn signed_data_slot(&mut self) -> Option<&mut Option<SignedData>> {
        match self {
            Operation::Create(_) => None,
            Operation::Update(op) => Some(&mut op.signed_data),
            Operation::Recover(op) => Some(&mut op.signed_data),
            Operation::Revoke(op) => Some(&mut op.signed_data),
        }
    }

    /// Canonical payload bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(canonicalize(self)?)
    }

    /// Decode an operation payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| EngineError::MalformedOperation(e.to_string()))
    }

    /// Decode an operation from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_bytes(json.as_bytes())
    }

    /// The bytes a seal signs: the canonical operation without `signedData`.
    pub fn signing_input(&self) -> Result<Vec<u8>> {
        let mut unsigned = self.clone();
        if let Some(slot) = unsigned.signed_data_slot() {
            *slot = None;
        }
        unsigned.to_bytes()
    }

    /// Seal the operation with an Ed25519 keypair.
    ///
    /// Replaces any existing seal. Create operations carry no seal.
    pub fn sign(mut self, keypair: &Keypair) -> Result<Self> {
        if matches!(self, Operation::Create(_)) {
            return Err(EngineError::MalformedOperation(
                "create operations cannot be sealed".into(),
            ));
        }

        let signature = keypair.sign(&self.signing_input()?);
        if let Some(slot) = self.signed_data_slot() {
            *slot = Some(SignedData {
                public_key: keypair.public_key().to_vec(),
                signature: signature.to_vec(),
            });
        }
        Ok(self)
    }

    /// Check the seal, if any. Unsealed operations pass.
    pub fn verify_seal(&self, verifier: &dyn SignatureVerifier) -> Result<()> {
        let Some(signed) = self.signed_data() else {
            return Ok(());
        };
        let message = self.signing_input()?;
        verifier.verify(&signed.public_key, &message, &signed.signature)?;
        Ok(())
    }
}

mod base64url_bytes {
    use serde::{Deserialize, Deserializer, Serializer};
    use sidetree_engine_core::multihash::{decode_base64url, encode_base64url};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_base64url(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        decode_base64url(&s).map_err(serde::de::Error::custom)
    }
}
