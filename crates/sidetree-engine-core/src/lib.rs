//! # Sidetree Engine Core
//!
//! Pure primitives for the Sidetree engine: content addressing, canonical
//! JSON, commitments and the protocol version registry.
//!
//! This crate contains no I/O, no storage, no networking. Every function is
//! a deterministic computation over its inputs.
//!
//! ## Key Types
//!
//! - [`Multihash`] - Self-describing digest {algorithm, length, bytes}
//! - [`UniqueSuffix`] - Content-derived DID identifier
//! - [`Commitment`] / [`RevealValue`] - The commit-reveal pair
//! - [`ProtocolRegistry`] - Protocol parameters resolved by anchor time
//!
//! ## Canonicalization
//!
//! Everything that is hashed is first encoded as RFC 8785 canonical JSON.
//! See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod multihash;
pub mod protocol;
pub mod types;

pub use canonical::{canonical_hash, canonical_len, canonicalize, unique_suffix};
pub use crypto::{Ed25519Verifier, Keypair, SignatureVerifier};
pub use error::{CoreError, Result};
pub use multihash::{hash, hash_with, HashAlgorithm, Multihash};
pub use protocol::{ProtocolParameters, ProtocolRegistry};
pub use types::{Commitment, RevealValue, UniqueSuffix};
