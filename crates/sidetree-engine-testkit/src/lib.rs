//! # Sidetree Engine Testkit
//!
//! Testing utilities for the Sidetree engine.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Create operations with pinned commitments, delta
//!   hashes and suffixes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A DID under test with its anchored history
//!
//! ## Golden Vectors
//!
//! Golden vectors pin the content addressing rules:
//!
//! ```rust
//! use sidetree_engine_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, suffix) in verify_all_vectors() {
//!     assert!(matches, "{} produced {}", name, suffix);
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sidetree_engine_testkit::generators::{create_from_params, CreateParams};
//!
//! proptest! {
//!     #[test]
//!     fn suffix_is_deterministic(params: CreateParams) {
//!         let a = create_from_params(&params).did_suffix().unwrap();
//!         let b = create_from_params(&params).did_suffix().unwrap();
//!         prop_assert_eq!(a, b);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Drive a DID through its lifecycle:
//!
//! ```rust
//! use sidetree_engine_testkit::fixtures::{add_key_patch, TestFixture};
//!
//! let mut fixture = TestFixture::new();
//! fixture.create(r#"{"publicKeys":[]}"#).unwrap();
//! fixture.update(vec![add_key_patch("k1")]).unwrap();
//! assert_eq!(fixture.document().unwrap().public_key_ids(), vec!["k1"]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{add_key_patch, multi_did_fixtures, remove_key_patch, TestFixture};
pub use generators::{create_from_params, CreateParams};
pub use vectors::{all_vectors, generate_create_from_vector, verify_all_vectors, GoldenVector};
