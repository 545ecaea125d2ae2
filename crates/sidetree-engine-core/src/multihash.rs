//! Multihash content addressing.
//!
//! A multihash is a self-describing digest:
//! `varint(code) || varint(digest_len) || digest`. In text form it is
//! encoded as unpadded base64url.
//!
//! Multihashes are only produced by [`hash`] (or decoded from their wire
//! form); nothing else in the engine assembles one by hand.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256, Sha512};
use std::fmt;

use crate::error::{CoreError, Result};

/// Digest algorithms the engine can address content with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum HashAlgorithm {
    /// sha2-256, multihash code 0x12 (18).
    Sha2_256 = 0x12,
    /// sha2-512, multihash code 0x13 (19).
    Sha2_512 = 0x13,
    /// blake3 with a 32-byte output, multihash code 0x1e (30).
    Blake3_256 = 0x1e,
}

impl HashAlgorithm {
    /// The multihash code of this algorithm.
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Look up an algorithm by its multihash code.
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0x12 => Ok(Self::Sha2_256),
            0x13 => Ok(Self::Sha2_512),
            0x1e => Ok(Self::Blake3_256),
            other => Err(CoreError::UnsupportedAlgorithm(other)),
        }
    }

    /// Length of the digest this algorithm produces.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha2_256 | Self::Blake3_256 => 32,
            Self::Sha2_512 => 64,
        }
    }

    /// Compute the raw digest of `data`.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha2_256 => Sha256::digest(data).to_vec(),
            Self::Sha2_512 => Sha512::digest(data).to_vec(),
            Self::Blake3_256 => blake3::hash(data).as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sha2_256 => "sha2-256",
            Self::Sha2_512 => "sha2-512",
            Self::Blake3_256 => "blake3",
        };
        f.write_str(name)
    }
}

/// A self-describing digest: algorithm, digest length and digest bytes.
///
/// Two multihashes are equal iff all three match.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Multihash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl Multihash {
    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The raw digest bytes.
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Binary multihash layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.digest.len() + 4);
        encode_varint(&mut buf, self.algorithm.code());
        encode_varint(&mut buf, self.digest.len() as u64);
        buf.extend_from_slice(&self.digest);
        buf
    }

    /// Parse the binary multihash layout.
    ///
    /// Rejects unknown codes, truncated input, trailing bytes and digests
    /// whose length differs from the algorithm's output length.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (code, rest) = decode_varint(bytes)?;
        let algorithm = HashAlgorithm::from_code(code)?;
        let (len, digest) = decode_varint(rest)?;

        if digest.len() as u64 != len {
            return Err(CoreError::MalformedMultihash(format!(
                "declared length {} but {} digest bytes present",
                len,
                digest.len()
            )));
        }
        if digest.len() != algorithm.digest_len() {
            return Err(CoreError::MalformedMultihash(format!(
                "{} digest must be {} bytes, got {}",
                algorithm,
                algorithm.digest_len(),
                digest.len()
            )));
        }

        Ok(Self {
            algorithm,
            digest: digest.to_vec(),
        })
    }

    /// Unpadded base64url of the binary layout.
    pub fn to_base64url(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    /// Parse from unpadded base64url.
    pub fn from_base64url(s: &str) -> Result<Self> {
        let bytes = decode_base64url(s)?;
        Self::from_bytes(&bytes)
    }

    /// Hex of the binary layout.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Multihash({}:{})",
            self.algorithm,
            &hex::encode(&self.digest)[..16]
        )
    }
}

impl fmt::Display for Multihash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64url())
    }
}

impl Serialize for Multihash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for Multihash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Multihash::from_base64url(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash `data` with the algorithm named by `code`.
pub fn hash(data: &[u8], code: u64) -> Result<Multihash> {
    let algorithm = HashAlgorithm::from_code(code)?;
    Ok(hash_with(data, algorithm))
}

/// Hash `data` with an already-resolved algorithm.
pub fn hash_with(data: &[u8], algorithm: HashAlgorithm) -> Multihash {
    Multihash {
        algorithm,
        digest: algorithm.digest(data),
    }
}

/// Encode bytes as unpadded base64url.
pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url.
pub fn decode_base64url(s: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(s)
        .map_err(|e| CoreError::Encoding(e.to_string()))
}

/// Append an unsigned LEB128 varint.
fn encode_varint(buf: &mut Vec<u8>, mut n: u64) {
    while n >= 0x80 {
        buf.push((n as u8 & 0x7f) | 0x80);
        n >>= 7;
    }
    buf.push(n as u8);
}

/// Read an unsigned LEB128 varint, returning it and the remaining bytes.
fn decode_varint(bytes: &[u8]) -> Result<(u64, &[u8])> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        // multiformats caps varints at 9 bytes
        if i >= 9 {
            break;
        }
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, &bytes[i + 1..]));
        }
    }
    Err(CoreError::MalformedMultihash("truncated varint".into()))
}
