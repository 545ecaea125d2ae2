//! Materialized DID state.
//!
//! A `DidState` is what the replay fold carries from one operation to the
//! next: the document plus the two chain cursors. An unpublished DID has no
//! state at all.

use sidetree_engine_core::{Commitment, HashAlgorithm, UniqueSuffix};
use sidetree_engine_patch::Document;

/// Lifecycle of a published DID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Created and accepting operations.
    Published,
    /// Revoked. Terminal.
    Revoked,
}

/// The state of one DID after replaying its operations.
#[derive(Debug, Clone, PartialEq)]
pub struct DidState {
    /// The DID suffix.
    pub suffix: UniqueSuffix,
    /// Hash algorithm pinned at create time.
    pub algorithm: HashAlgorithm,
    /// The current document.
    pub document: Document,
    /// Commitment the next recover or revoke must reveal.
    pub recovery_commitment: Commitment,
    /// Commitment the next update must reveal.
    pub update_commitment: Commitment,
    pub lifecycle: Lifecycle,
    /// Anchor time of the last applied operation.
    pub last_anchor_time: u64,
    /// Number of operations applied, the create included.
    pub applied_operations: usize,
}

impl DidState {
    /// Whether the DID has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.lifecycle == Lifecycle::Revoked
    }

    /// The full DID under `namespace`.
    pub fn did(&self, namespace: &str) -> String {
        format!("{}:{}", namespace, self.suffix)
    }

    /// Record that an operation anchored at `anchor_time` was applied.
    pub(crate) fn advance(&mut self, anchor_time: u64) {
        self.last_anchor_time = anchor_time;
        self.applied_operations += 1;
    }
}
