//! Protocol versions and the registry that resolves them by anchor time.
//!
//! Every operation is validated under the parameters that were active when
//! it was anchored. The registry is built once, sorted at construction,
//! and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::multihash::HashAlgorithm;

/// Default limit on chunk, map and anchor files, in bytes.
pub const DEFAULT_MAX_FILE_SIZE: usize = 2_000_000;

/// An immutable set of protocol parameters, keyed by its activation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolParameters {
    /// Anchor time from which these parameters apply.
    pub starting_anchor_time: u64,

    /// Multihash code of the default hash algorithm.
    pub hash_algorithm: u64,

    /// Maximum operations per anchored batch.
    pub max_operations_per_batch: u32,

    /// Maximum canonical size of a delta, document or patch list.
    pub max_delta_byte_size: usize,

    /// Compression applied to anchor files.
    pub compression_algorithm: String,

    /// Maximum chunk file size in bytes.
    pub max_chunk_file_size: usize,

    /// Maximum map file size in bytes.
    pub max_map_file_size: usize,

    /// Maximum anchor file size in bytes.
    pub max_anchor_file_size: usize,

    /// Whether replace-style patches are accepted.
    pub enable_replace_patch: bool,
}

impl ProtocolParameters {
    /// The default hash algorithm, resolved.
    pub fn hash_algorithm(&self) -> Result<HashAlgorithm> {
        HashAlgorithm::from_code(self.hash_algorithm)
    }

    /// Copy of these parameters activating at a different time.
    pub fn starting_at(mut self, anchor_time: u64) -> Self {
        self.starting_anchor_time = anchor_time;
        self
    }
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            starting_anchor_time: 0,
            hash_algorithm: HashAlgorithm::Sha2_256.code(),
            // one operation per batch: the batch is cut right away
            max_operations_per_batch: 1,
            max_delta_byte_size: 200_000,
            compression_algorithm: "GZIP".to_string(),
            max_chunk_file_size: DEFAULT_MAX_FILE_SIZE,
            max_map_file_size: DEFAULT_MAX_FILE_SIZE,
            max_anchor_file_size: DEFAULT_MAX_FILE_SIZE,
            enable_replace_patch: true,
        }
    }
}

/// A validated, ascending list of protocol versions.
///
/// Invariant: non-empty, strictly ascending by `starting_anchor_time`, and
/// every version names a supported hash algorithm.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    versions: Vec<ProtocolParameters>,
}

impl ProtocolRegistry {
    /// Build a registry, sorting versions by activation time.
    pub fn new(mut versions: Vec<ProtocolParameters>) -> Result<Self> {
        if versions.is_empty() {
            return Err(CoreError::EmptyRegistry);
        }

        for version in &versions {
            version.hash_algorithm()?;
        }

        versions.sort_by_key(|v| v.starting_anchor_time);

        if let Some(pair) = versions
            .windows(2)
            .find(|w| w[0].starting_anchor_time == w[1].starting_anchor_time)
        {
            return Err(CoreError::DuplicateActivationTime(
                pair[0].starting_anchor_time,
            ));
        }

        Ok(Self { versions })
    }

    /// Build a registry from a JSON array of parameter sets.
    pub fn from_json(json: &str) -> Result<Self> {
        let versions: Vec<ProtocolParameters> =
            serde_json::from_str(json).map_err(|e| CoreError::Encoding(e.to_string()))?;
        Self::new(versions)
    }

    /// The parameters with the greatest activation time.
    pub fn current(&self) -> &ProtocolParameters {
        // non-empty by construction
        &self.versions[self.versions.len() - 1]
    }

    /// The parameters active at `anchor_time`.
    pub fn resolve(&self, anchor_time: u64) -> Result<&ProtocolParameters> {
        self.versions
            .iter()
            .rev()
            .find(|v| v.starting_anchor_time <= anchor_time)
            .ok_or(CoreError::NoApplicableProtocol { anchor_time })
    }

    /// All versions, ascending.
    pub fn versions(&self) -> &[ProtocolParameters] {
        &self.versions
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self {
            versions: vec![ProtocolParameters::default()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn version(start: u64, max_delta: usize) -> ProtocolParameters {
        ProtocolParameters {
            max_delta_byte_size: max_delta,
            ..ProtocolParameters::default()
        }
        .starting_at(start)
    }

    #[test]
    fn test_default_matches_reference_protocol() {
        let p = ProtocolParameters::default();
        assert_eq!(p.hash_algorithm, 18);
        assert_eq!(p.max_operations_per_batch, 1);
        assert_eq!(p.max_delta_byte_size, 200_000);
        assert_eq!(p.compression_algorithm, "GZIP");
        assert!(p.enable_replace_patch);
    }

    #[test]
    fn test_resolve_picks_latest_not_after() {
        let registry =
            ProtocolRegistry::new(vec![version(0, 1), version(100, 2), version(200, 3)]).unwrap();

        assert_eq!(registry.resolve(0).unwrap().max_delta_byte_size, 1);
        assert_eq!(registry.resolve(99).unwrap().max_delta_byte_size, 1);
        assert_eq!(registry.resolve(100).unwrap().max_delta_byte_size, 2);
        assert_eq!(registry.resolve(150).unwrap().max_delta_byte_size, 2);
        assert_eq!(registry.resolve(u64::MAX).unwrap().max_delta_byte_size, 3);
        assert_eq!(registry.current().max_delta_byte_size, 3);
    }

    #[test]
    fn test_resolve_before_first_fails() {
        let registry = ProtocolRegistry::new(vec![version(10, 1)]).unwrap();
        assert_eq!(
            registry.resolve(9).unwrap_err(),
            CoreError::NoApplicableProtocol { anchor_time: 9 }
        );
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let registry =
            ProtocolRegistry::new(vec![version(200, 3), version(0, 1), version(100, 2)]).unwrap();
        let starts: Vec<u64> = registry
            .versions()
            .iter()
            .map(|v| v.starting_anchor_time)
            .collect();
        assert_eq!(starts, vec![0, 100, 200]);
        assert_eq!(registry.current().starting_anchor_time, 200);
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(
            ProtocolRegistry::new(vec![]).unwrap_err(),
            CoreError::EmptyRegistry
        );
    }

    #[test]
    fn test_duplicate_activation_rejected() {
        assert_eq!(
            ProtocolRegistry::new(vec![version(5, 1), version(5, 2)]).unwrap_err(),
            CoreError::DuplicateActivationTime(5)
        );
    }

    #[test]
    fn test_unsupported_algorithm_rejected() {
        let bad = ProtocolParameters {
            hash_algorithm: 0x99,
            ..ProtocolParameters::default()
        };
        assert_eq!(
            ProtocolRegistry::new(vec![bad]).unwrap_err(),
            CoreError::UnsupportedAlgorithm(0x99)
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "startingAnchorTime": 500,
                "hashAlgorithm": 18,
                "maxOperationsPerBatch": 10,
                "maxDeltaByteSize": 1000,
                "compressionAlgorithm": "GZIP",
                "maxChunkFileSize": 2000000,
                "maxMapFileSize": 2000000,
                "maxAnchorFileSize": 2000000,
                "enableReplacePatch": false
            },
            {
                "startingAnchorTime": 0,
                "hashAlgorithm": 18,
                "maxOperationsPerBatch": 1,
                "maxDeltaByteSize": 200000,
                "compressionAlgorithm": "GZIP",
                "maxChunkFileSize": 2000000,
                "maxMapFileSize": 2000000,
                "maxAnchorFileSize": 2000000,
                "enableReplacePatch": true
            }
        ]"#;
        let registry = ProtocolRegistry::from_json(json).unwrap();
        assert!(registry.resolve(499).unwrap().enable_replace_patch);
        assert!(!registry.resolve(500).unwrap().enable_replace_patch);
    }

    proptest! {
        #[test]
        fn prop_resolve_returns_greatest_activation_not_after(
            starts in prop::collection::btree_set(0u64..10_000, 1..8),
            t in 0u64..12_000,
        ) {
            let versions: Vec<_> = starts.iter().map(|s| version(*s, *s as usize)).collect();
            let registry = ProtocolRegistry::new(versions).unwrap();

            let expected = starts.iter().rev().find(|s| **s <= t).copied();
            match (registry.resolve(t), expected) {
                (Ok(p), Some(s)) => prop_assert_eq!(p.starting_anchor_time, s),
                (Err(CoreError::NoApplicableProtocol { anchor_time }), None) => {
                    prop_assert_eq!(anchor_time, t)
                }
                (other, exp) => prop_assert!(false, "got {:?}, expected {:?}", other, exp),
            }
        }
    }
}
