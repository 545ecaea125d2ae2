//! Strong type definitions for the Sidetree engine.
//!
//! Suffixes, commitments and reveal values are newtypes so they cannot be
//! confused with each other or with arbitrary strings.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::Result;
use crate::multihash::{decode_base64url, encode_base64url, hash_with, HashAlgorithm, Multihash};

/// The content-derived identifier of a DID.
///
/// Always the base64url text of a well-formed multihash; the multihash code
/// pins the hash algorithm for the DID's whole lifetime.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniqueSuffix(String);

impl UniqueSuffix {
    /// Wrap a multihash as a suffix.
    pub fn from_multihash(mh: &Multihash) -> Self {
        Self(mh.to_base64url())
    }

    /// Parse and validate a suffix string.
    pub fn parse(s: &str) -> Result<Self> {
        Multihash::from_base64url(s)?;
        Ok(Self(s.to_string()))
    }

    /// The algorithm pinned by this suffix.
    pub fn algorithm(&self) -> Result<HashAlgorithm> {
        Ok(Multihash::from_base64url(&self.0)?.algorithm())
    }

    /// The suffix text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UniqueSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniqueSuffix({})", self.0)
    }
}

impl fmt::Display for UniqueSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for UniqueSuffix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UniqueSuffix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UniqueSuffix::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A commitment: the multihash of a reveal value that the next operation on
/// the same chain must disclose.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Commitment(Multihash);

impl Commitment {
    /// Commit to a reveal value.
    pub fn from_reveal(reveal: &RevealValue, algorithm: HashAlgorithm) -> Self {
        Self(hash_with(reveal.as_bytes(), algorithm))
    }

    /// Wrap an existing multihash.
    pub fn from_multihash(mh: Multihash) -> Self {
        Self(mh)
    }

    /// Parse from base64url text.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Self(Multihash::from_base64url(s)?))
    }

    /// Whether `reveal` is the pre-image of this commitment under `algorithm`.
    ///
    /// Exact comparison of code, length and digest.
    pub fn is_revealed_by(&self, reveal: &RevealValue, algorithm: HashAlgorithm) -> bool {
        hash_with(reveal.as_bytes(), algorithm) == self.0
    }

    /// The algorithm this commitment was computed with.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.0.algorithm()
    }

    /// The underlying multihash.
    pub fn as_multihash(&self) -> &Multihash {
        &self.0
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({:?})", self.0)
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// The pre-image of a commitment.
///
/// Never printed: both `Debug` and the absence of `Display` keep it out of
/// logs and error messages.
#[derive(Clone, PartialEq, Eq)]
pub struct RevealValue(Vec<u8>);

impl RevealValue {
    /// Wrap raw reveal bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Commit to this value.
    pub fn commitment(&self, algorithm: HashAlgorithm) -> Commitment {
        Commitment::from_reveal(self, algorithm)
    }
}

impl fmt::Debug for RevealValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RevealValue(<redacted>)")
    }
}

impl From<&[u8]> for RevealValue {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for RevealValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_base64url(&self.0))
    }
}

impl<'de> Deserialize<'de> for RevealValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_base64url(&s).map_err(serde::de::Error::custom)?;
        if bytes.is_empty() {
            return Err(serde::de::Error::custom("reveal value must not be empty"));
        }
        Ok(Self(bytes))
    }
}
