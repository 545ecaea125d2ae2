//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sidetree_engine::{build_create, Operation};
use sidetree_engine_core::{HashAlgorithm, ProtocolParameters, RevealValue};
use sidetree_engine_patch::{Document, Patch, PublicKey};

/// Generate a supported hash algorithm.
pub fn hash_algorithm() -> impl Strategy<Value = HashAlgorithm> {
    prop_oneof![
        Just(HashAlgorithm::Sha2_256),
        Just(HashAlgorithm::Sha2_512),
        Just(HashAlgorithm::Blake3_256),
    ]
}

/// Generate a non-empty reveal value.
pub fn reveal_value() -> impl Strategy<Value = RevealValue> {
    prop::collection::vec(any::<u8>(), 1..=64).prop_map(RevealValue::new)
}

/// Generate a valid public key or service id.
pub fn entry_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,50}".prop_map(String::from)
}

/// Generate a well-formed public key entry.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    (
        entry_id(),
        prop::sample::subsequence(vec!["ops", "general", "auth", "assertion", "agreement"], 1..=3),
        prop::collection::vec(any::<u8>(), 33),
    )
        .prop_map(|(id, usage, material)| PublicKey {
            id,
            usage: usage.into_iter().map(String::from).collect(),
            key_type: "Secp256k1VerificationKey2018".to_string(),
            controller: None,
            public_key_hex: Some(hex::encode(material)),
            public_key_base58: None,
            public_key_jwk: None,
            public_key_multibase: None,
        })
}

/// Generate up to `max` public keys with distinct ids.
pub fn public_keys(max: usize) -> impl Strategy<Value = Vec<PublicKey>> {
    prop::collection::vec(public_key(), 0..=max).prop_map(|keys| {
        let mut seen = std::collections::HashSet::new();
        keys.into_iter().filter(|k| seen.insert(k.id.clone())).collect()
    })
}

/// Generate a document holding only a public key list.
pub fn document() -> impl Strategy<Value = Document> {
    public_keys(4).prop_map(|keys| {
        let value = serde_json::json!({ "publicKeys": keys });
        match Document::from_value(value) {
            Ok(document) => document,
            Err(e) => panic!("generated document is not an object: {}", e),
        }
    })
}

/// Generate a non-empty `add-public-keys` patch.
pub fn add_public_keys_patch() -> impl Strategy<Value = Patch> {
    public_keys(3)
        .prop_filter("need at least one key", |keys| !keys.is_empty())
        .prop_map(|public_keys| Patch::AddPublicKeys { public_keys })
}

/// Generate a `remove-public-keys` patch.
pub fn remove_public_keys_patch() -> impl Strategy<Value = Patch> {
    prop::collection::vec(entry_id(), 1..=3).prop_map(|public_keys| Patch::RemovePublicKeys {
        public_keys,
    })
}

/// Generate protocol parameters with a reasonable delta limit.
pub fn protocol_parameters() -> impl Strategy<Value = ProtocolParameters> {
    (0u64..1_000_000, hash_algorithm(), 1_000usize..=200_000, any::<bool>()).prop_map(
        |(start, algorithm, max_delta, replace)| ProtocolParameters {
            starting_anchor_time: start,
            hash_algorithm: algorithm.code(),
            max_delta_byte_size: max_delta,
            enable_replace_patch: replace,
            ..ProtocolParameters::default()
        },
    )
}

/// Parameters for generating a create operation.
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub algorithm: HashAlgorithm,
    pub document: Document,
    pub recovery: RevealValue,
    pub update: RevealValue,
}

impl Arbitrary for CreateParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (hash_algorithm(), document(), reveal_value(), reveal_value())
            .prop_map(|(algorithm, document, recovery, update)| CreateParams {
                algorithm,
                document,
                recovery,
                update,
            })
            .boxed()
    }
}

/// Generate a create operation from parameters.
pub fn create_from_params(params: &CreateParams) -> Operation {
    let protocol = ProtocolParameters {
        hash_algorithm: params.algorithm.code(),
        ..ProtocolParameters::default()
    };
    let result = build_create(
        &protocol,
        params.algorithm.code(),
        params.document.clone(),
        params.recovery.commitment(params.algorithm),
        params.update.commitment(params.algorithm),
    );
    match result {
        Ok(op) => op,
        Err(e) => panic!("generated create failed to build: {}", e),
    }
}
