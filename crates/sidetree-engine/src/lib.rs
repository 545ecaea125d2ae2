//! # Sidetree Engine
//!
//! Operation construction, validation and replay for a Sidetree-style DID
//! method.
//!
//! ## Overview
//!
//! A DID is never stored. Its document is derived by replaying the
//! operations anchored for it, in anchoring-time order, under the protocol
//! version active at each operation's anchor time.
//!
//! - **Create**: derives the suffix and opens both commitment chains
//! - **Update**: reveals the update commitment and applies patches
//! - **Recover**: reveals the recovery commitment and replaces the document
//! - **Revoke**: reveals the recovery commitment and ends the DID
//!
//! ## Usage
//!
//! ```rust
//! use sidetree_engine::{AnchoredOperation, Engine};
//! use sidetree_engine::core::{HashAlgorithm, RevealValue};
//! use sidetree_engine::patch::{Document, Patch};
//!
//! let engine = Engine::default();
//! let recovery = RevealValue::new("recoveryOTP");
//! let update = RevealValue::new("updateOTP");
//! let alg = HashAlgorithm::Sha2_256;
//!
//! let document = Document::from_json(r#"{"publicKeys":[]}"#).unwrap();
//! let create = engine
//!     .build_create(document, recovery.commitment(alg), update.commitment(alg))
//!     .unwrap();
//! let suffix = create.did_suffix().unwrap();
//!
//! let mut history = vec![AnchoredOperation::new(1, create)];
//! let state = engine.resolve(&suffix, &history).unwrap().state;
//!
//! let patch = Patch::remove_public_keys(r#"["unused"]"#).unwrap();
//! let next = RevealValue::new("updateOTP2");
//! let op = engine
//!     .build_update(&state, &update, vec![patch], next.commitment(alg))
//!     .unwrap();
//! history.push(AnchoredOperation::new(2, op));
//!
//! let document = engine.resolve_document(&suffix, &history).unwrap();
//! assert_eq!(document.id(), Some(engine.did(&suffix).as_str()));
//! ```
//!
//! ## Re-exports
//!
//! - `sidetree_engine::core` - multihash, commitments, protocol registry
//! - `sidetree_engine::patch` - document model and patch kinds

pub mod builder;
pub mod engine;
pub mod error;
pub mod operation;
pub mod resolver;
pub mod state;
pub mod validation;

// Re-export component crates
pub use sidetree_engine_core as core;
pub use sidetree_engine_patch as patch;

pub use builder::{build_create, build_recover, build_revoke, build_update};
pub use engine::{Engine, EngineConfig, DEFAULT_NAMESPACE, INITIAL_VALUES_PARAM};
pub use error::{EngineError, Result};
pub use operation::{
    CreateDelta, CreateOperation, Delta, Operation, RecoverOperation, RevokeOperation, SignedData,
    SuffixData, UpdateOperation,
};
pub use resolver::{AnchoredOperation, RejectedOperation, Resolution, Resolver};
pub use state::{DidState, Lifecycle};

// Re-export commonly used types
pub use sidetree_engine_core::{
    Commitment, HashAlgorithm, Multihash, ProtocolParameters, ProtocolRegistry, RevealValue,
    UniqueSuffix,
};
pub use sidetree_engine_patch::{Document, Patch};
