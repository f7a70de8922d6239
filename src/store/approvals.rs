//! Approval tracker: outstanding and granted authorities per proposal.
//!
//! For each proposal, a level lives in exactly one of `requested_approvals`
//! or `provided_approvals`, and only levels requested at creation ever
//! appear. `approve` and `unapprove` move a single entry across.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Name, PermissionLevel, ProposalKey, TimePoint};

/// An authority level with the time it last changed sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub level: PermissionLevel,
    pub time: TimePoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalsInfo {
    pub proposal_name: Name,
    pub requested_approvals: Vec<Approval>,
    pub provided_approvals: Vec<Approval>,
}

impl ApprovalsInfo {
    pub fn is_requested(&self, level: &PermissionLevel) -> bool {
        self.requested_approvals.iter().any(|a| &a.level == level)
    }

    pub fn is_provided(&self, level: &PermissionLevel) -> bool {
        self.provided_approvals.iter().any(|a| &a.level == level)
    }
}

/// Approval record layout that predates per-entry timestamps.
///
/// Only read from old snapshots; see `ApprovalTracker::migrate_legacy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyApprovalsInfo {
    pub proposal_name: Name,
    pub requested_approvals: Vec<PermissionLevel>,
    pub provided_approvals: Vec<PermissionLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalTracker {
    /// proposer -> proposal_name -> approvals
    partitions: BTreeMap<Name, BTreeMap<Name, ApprovalsInfo>>,
}

impl ApprovalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a proposal with every level outstanding.
    ///
    /// Duplicate levels in `requested` collapse to one entry.
    pub fn open(&mut self, key: &ProposalKey, requested: &[PermissionLevel]) {
        let mut requested_approvals: Vec<Approval> = Vec::with_capacity(requested.len());
        for level in requested {
            if !requested_approvals.iter().any(|a| &a.level == level) {
                requested_approvals.push(Approval {
                    level: *level,
                    time: TimePoint::ZERO,
                });
            }
        }

        self.partitions.entry(key.proposer).or_default().insert(
            key.proposal_name,
            ApprovalsInfo {
                proposal_name: key.proposal_name,
                requested_approvals,
                provided_approvals: Vec::new(),
            },
        );
    }

    pub fn get(&self, key: &ProposalKey) -> Option<&ApprovalsInfo> {
        self.partitions
            .get(&key.proposer)
            .and_then(|partition| partition.get(&key.proposal_name))
    }

    fn get_mut(&mut self, key: &ProposalKey) -> Option<&mut ApprovalsInfo> {
        self.partitions
            .get_mut(&key.proposer)
            .and_then(|partition| partition.get_mut(&key.proposal_name))
    }

    /// Move `level` from requested to provided, stamped `now`.
    ///
    /// Returns `false` and changes nothing when the proposal is unknown or
    /// the level is not outstanding.
    pub fn approve(&mut self, key: &ProposalKey, level: &PermissionLevel, now: TimePoint) -> bool {
        let Some(info) = self.get_mut(key) else {
            return false;
        };
        let Some(pos) = info.requested_approvals.iter().position(|a| &a.level == level) else {
            return false;
        };

        info.requested_approvals.remove(pos);
        info.provided_approvals.push(Approval {
            level: *level,
            time: now,
        });
        true
    }

    /// Move `level` from provided back to requested, stamped `now`.
    pub fn unapprove(
        &mut self,
        key: &ProposalKey,
        level: &PermissionLevel,
        now: TimePoint,
    ) -> bool {
        let Some(info) = self.get_mut(key) else {
            return false;
        };
        let Some(pos) = info.provided_approvals.iter().position(|a| &a.level == level) else {
            return false;
        };

        info.provided_approvals.remove(pos);
        info.requested_approvals.push(Approval {
            level: *level,
            time: now,
        });
        true
    }

    pub fn remove(&mut self, key: &ProposalKey) -> Option<ApprovalsInfo> {
        let partition = self.partitions.get_mut(&key.proposer)?;
        let removed = partition.remove(&key.proposal_name);
        if partition.is_empty() {
            self.partitions.remove(&key.proposer);
        }
        removed
    }

    /// Fold legacy records into the timestamped layout.
    ///
    /// Legacy approvals carry no grant time, so they are stamped with the
    /// epoch: any invalidation of the approving account voids them, which is
    /// how the legacy layout was evaluated. A timestamped record that already
    /// exists for the same proposal wins and the legacy one is dropped.
    /// Returns the number of records migrated.
    pub fn migrate_legacy(
        &mut self,
        legacy: impl IntoIterator<Item = (Name, LegacyApprovalsInfo)>,
    ) -> usize {
        let stamp = |level: PermissionLevel| Approval {
            level,
            time: TimePoint::ZERO,
        };

        let mut migrated = 0;
        for (proposer, old) in legacy {
            let partition = self.partitions.entry(proposer).or_default();
            if partition.contains_key(&old.proposal_name) {
                tracing::warn!(
                    %proposer,
                    proposal = %old.proposal_name,
                    "dropping legacy approvals shadowed by a current record"
                );
                continue;
            }
            partition.insert(
                old.proposal_name,
                ApprovalsInfo {
                    proposal_name: old.proposal_name,
                    requested_approvals: old.requested_approvals.into_iter().map(stamp).collect(),
                    provided_approvals: old.provided_approvals.into_iter().map(stamp).collect(),
                },
            );
            migrated += 1;
        }
        migrated
    }

    pub fn len(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
