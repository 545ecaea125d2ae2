//! Canonical JSON encoding for deterministic hashing.
//!
//! This module implements RFC 8785 JSON Canonicalization (JCS):
//! - Object members sorted by UTF-16 code units of their names
//! - No insignificant whitespace
//! - Numbers in their shortest ECMAScript form
//!
//! Everything that gets hashed (suffix data, deltas, signing inputs) goes
//! through [`canonicalize`] first, so the same logical value yields the same
//! bytes on every platform.

use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::multihash::{hash_with, HashAlgorithm, Multihash};
use crate::types::UniqueSuffix;

/// Encode a serializable value to canonical JSON bytes.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_jcs::to_vec(value).map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Canonicalize a value and hash the result.
pub fn canonical_hash<T: Serialize + ?Sized>(
    value: &T,
    algorithm: HashAlgorithm,
) -> Result<Multihash> {
    let bytes = canonicalize(value)?;
    Ok(hash_with(&bytes, algorithm))
}

/// Derive the unique suffix of a DID from its suffix data.
///
/// suffix = base64url(multihash(JCS(suffix_data)))
pub fn unique_suffix<T: Serialize + ?Sized>(
    suffix_data: &T,
    algorithm: HashAlgorithm,
) -> Result<UniqueSuffix> {
    let mh = canonical_hash(suffix_data, algorithm)?;
    Ok(UniqueSuffix::from_multihash(&mh))
}

/// Size in bytes of a value's canonical encoding.
pub fn canonical_len<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    Ok(canonicalize(value)?.len())
}
