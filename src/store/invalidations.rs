//! Invalidation registry: per-account "approvals up to here are void" watermarks.
//!
//! Sparse and global. Proposals are never scanned when an account
//! invalidates; liveness is decided lazily when a proposal executes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::approvals::Approval;
use crate::types::{Name, TimePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidation {
    pub account: Name,
    pub last_invalidation_time: TimePoint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationRegistry {
    records: BTreeMap<Name, Invalidation>,
}

impl InvalidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `account`'s watermark to `now`, creating the record if needed.
    pub fn invalidate(&mut self, account: Name, now: TimePoint) {
        self.records
            .entry(account)
            .and_modify(|record| record.last_invalidation_time = now)
            .or_insert(Invalidation {
                account,
                last_invalidation_time: now,
            });
    }

    pub fn get(&self, account: Name) -> Option<&Invalidation> {
        self.records.get(&account)
    }

    /// An approval is live unless its actor invalidated at or after the grant.
    pub fn is_live(&self, approval: &Approval) -> bool {
        match self.records.get(&approval.level.actor) {
            None => true,
            Some(record) => record.last_invalidation_time < approval.time,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
