//! # Sidetree Engine Patch
//!
//! The DID document model and the patches that mutate it.
//!
//! ## Overview
//!
//! A document is a JSON object. Its `publicKeys` and `service` arrays are
//! ordered and their entry ids are unique. Documents only change through
//! [`Patch`]es, and applying a patch never mutates its input.
//!
//! ## Patch Kinds
//!
//! - **ietf-json-patch**: RFC 6902 add, remove and replace
//! - **add-public-keys** / **remove-public-keys**: key list edits
//! - **add-service-endpoints** / **remove-service-endpoints**: service edits
//! - **replace**: swap the whole document
//!
//! Replace-style patches are only accepted while the active protocol
//! version enables them (see [`Patch::check_allowed`]).
//!
//! ## Usage
//!
//! ```rust
//! use sidetree_engine_patch::{apply_patches, Document, Patch};
//!
//! let doc = Document::from_json(r#"{"publicKeys":[]}"#).unwrap();
//! let patch = Patch::add_public_keys(
//!     r#"[{"id":"k1","usage":["ops"],"type":"Secp256k1VerificationKey2018","publicKeyHex":"02"}]"#,
//! )
//! .unwrap();
//!
//! let updated = apply_patches(&doc, &[patch]).unwrap();
//! assert_eq!(updated.public_key_ids(), vec!["k1"]);
//! ```

pub mod document;
pub mod error;
pub mod patch;

pub use document::{validate_entry_id, Document, PublicKey, Service};
pub use error::{PatchError, Result};
pub use patch::{apply_patches, validate_patches, Patch};
