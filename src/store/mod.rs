//! Persistent state of the multisig workflow.
//!
//! Three independent keyed stores:
//! - `ProposalStore` (per proposer): proposed transactions
//! - `ApprovalTracker` (per proposer): requested/provided authorities
//! - `InvalidationRegistry` (global): per-account invalidation watermarks
//!
//! `MultisigState` bundles them and is snapshotted as CBOR.

pub mod approvals;
pub mod invalidations;
pub mod proposals;

pub use approvals::{Approval, ApprovalTracker, ApprovalsInfo, LegacyApprovalsInfo};
pub use invalidations::{Invalidation, InvalidationRegistry};
pub use proposals::{ProposalRecord, ProposalStore};

use serde::{Deserialize, Serialize};

use crate::serialization::{from_cbor, to_cbor, SerializationError};
use crate::types::Name;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Snapshot", into = "Snapshot")]
pub struct MultisigState {
    pub proposals: ProposalStore,
    pub approvals: ApprovalTracker,
    pub invalidations: InvalidationRegistry,
}

/// On-disk layout. `legacy_approvals` is read but never written.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    proposals: ProposalStore,
    #[serde(default)]
    approvals: ApprovalTracker,
    #[serde(default)]
    invalidations: InvalidationRegistry,
    #[serde(default, skip_serializing)]
    legacy_approvals: Vec<(Name, LegacyApprovalsInfo)>,
}

impl MultisigState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    /// Decode a snapshot, migrating any legacy approval records.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}

impl From<Snapshot> for MultisigState {
    fn from(snapshot: Snapshot) -> Self {
        let mut state = Self {
            proposals: snapshot.proposals,
            approvals: snapshot.approvals,
            invalidations: snapshot.invalidations,
        };

        if !snapshot.legacy_approvals.is_empty() {
            let found = snapshot.legacy_approvals.len();
            let migrated = state.approvals.migrate_legacy(snapshot.legacy_approvals);
            tracing::info!(found, migrated, "migrated legacy approval records");
        }
        state
    }
}

impl From<MultisigState> for Snapshot {
    fn from(state: MultisigState) -> Self {
        Self {
            proposals: state.proposals,
            approvals: state.approvals,
            invalidations: state.invalidations,
            legacy_approvals: Vec::new(),
        }
    }
}
