//! Golden test vectors for deterministic verification.
//!
//! These vectors pin commitments, delta hashes and unique suffixes so that
//! every implementation of the content addressing rules agrees byte for
//! byte. All vectors use sha2-256 (multihash code 18).

use sidetree_engine::{build_create, Operation};
use sidetree_engine_core::{HashAlgorithm, ProtocolParameters, RevealValue};
use sidetree_engine_patch::Document;

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Initial document JSON.
    pub document: &'static str,
    /// Recovery reveal value (UTF-8).
    pub recovery_reveal: &'static str,
    /// Update reveal value (UTF-8).
    pub update_reveal: &'static str,
    /// Expected recovery commitment (base64url).
    pub expected_recovery_commitment: &'static str,
    /// Expected update commitment (base64url).
    pub expected_update_commitment: &'static str,
    /// Expected delta hash (base64url).
    pub expected_delta_hash: &'static str,
    /// Expected unique suffix (base64url).
    pub expected_suffix: &'static str,
    /// Expected unique suffix as multihash hex.
    pub expected_suffix_hex: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Reference create with empty key list",
            document: r#"{"id":"","publicKeys":[]}"#,
            recovery_reveal: "recoveryOTP",
            update_reveal: "updateOTP",
            expected_recovery_commitment: "EiC_M-IIP-0K8WGCyIfm8Y64Y7Qpf2wSLtqSwAk_HYID8w",
            expected_update_commitment: "EiCOxAlFzF7x7FPddZCVXhrcd2DgdFyVIKSJ2m1OmEgBRg",
            expected_delta_hash: "EiBPxexo1VXdCkUup6Es60FCNgXmkPP5hQTJ_ilnbNHVBg",
            expected_suffix: "EiDEKicHH0L7nC9qXRdQuKF_8WCoMG0weP3OBDvGTWix6w",
            expected_suffix_hex:
                "1220c42a27071f42fb9c2f6a5d1750b8a17ff160a8306d3078fdce043bc64d68b1eb",
        },
        GoldenVector {
            name: "Empty document",
            document: "{}",
            recovery_reveal: "recoveryOTP",
            update_reveal: "updateOTP",
            expected_recovery_commitment: "EiC_M-IIP-0K8WGCyIfm8Y64Y7Qpf2wSLtqSwAk_HYID8w",
            expected_update_commitment: "EiCOxAlFzF7x7FPddZCVXhrcd2DgdFyVIKSJ2m1OmEgBRg",
            expected_delta_hash: "EiCz_Q9W64rC-98OR1T7kqyI7kipB7U3xc0KnrMc5OVYUw",
            expected_suffix: "EiAUroZPw01QPpJCjCAuOTAyYGoixDDRQDBBhU23JVGBKA",
            expected_suffix_hex:
                "122014ae864fc34d503e92428c202e393032606a22c430d1403041854db725518128",
        },
    ]
}

/// Generate the create operation described by a golden vector.
pub fn generate_create_from_vector(vector: &GoldenVector) -> Operation {
    let algorithm = HashAlgorithm::Sha2_256;
    let document = match Document::from_json(vector.document) {
        Ok(document) => document,
        Err(e) => panic!("vector '{}' has an invalid document: {}", vector.name, e),
    };

    let result = build_create(
        &ProtocolParameters::default(),
        algorithm.code(),
        document,
        RevealValue::new(vector.recovery_reveal).commitment(algorithm),
        RevealValue::new(vector.update_reveal).commitment(algorithm),
    );
    match result {
        Ok(op) => op,
        Err(e) => panic!("vector '{}' failed to build: {}", vector.name, e),
    }
}

/// Verify all golden vectors produce their pinned suffixes.
///
/// Returns `(name, matches, computed_suffix)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let computed = match generate_create_from_vector(v).did_suffix() {
                Ok(suffix) => suffix.to_string(),
                Err(e) => format!("error: {}", e),
            };
            let matches = computed == v.expected_suffix;
            (v.name.to_string(), matches, computed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidetree_engine_core::Multihash;

    #[test]
    fn test_vectors_match() {
        for vector in all_vectors() {
            let Operation::Create(op) = generate_create_from_vector(&vector) else {
                panic!("vector '{}' did not build a create", vector.name);
            };

            assert_eq!(
                op.suffix_data.recovery_commitment.to_string(),
                vector.expected_recovery_commitment,
                "recovery commitment of '{}'",
                vector.name
            );
            assert_eq!(
                op.delta.update_commitment.to_string(),
                vector.expected_update_commitment,
                "update commitment of '{}'",
                vector.name
            );
            assert_eq!(
                op.suffix_data.delta_hash.to_base64url(),
                vector.expected_delta_hash,
                "delta hash of '{}'",
                vector.name
            );

            let suffix = op.unique_suffix().unwrap();
            assert_eq!(suffix.as_str(), vector.expected_suffix, "suffix of '{}'", vector.name);

            let mh = Multihash::from_base64url(suffix.as_str()).unwrap();
            assert_eq!(mh.to_hex(), vector.expected_suffix_hex);
        }
    }

    #[test]
    fn test_verify_all_vectors() {
        for (name, matches, computed) in verify_all_vectors() {
            assert!(matches, "vector '{}' computed {}", name, computed);
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let b1 = generate_create_from_vector(&vector).to_bytes().unwrap();
            let b2 = generate_create_from_vector(&vector).to_bytes().unwrap();
            assert_eq!(b1, b2, "vector '{}' produced different bytes", vector.name);
        }
    }
}
