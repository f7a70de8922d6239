//! Proposal store: pending transactions keyed by proposer, then proposal name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Name, ProposalKey};

/// A proposed transaction, immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub proposal_name: Name,
    pub packed_transaction: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStore {
    /// proposer -> proposal_name -> record
    partitions: BTreeMap<Name, BTreeMap<Name, ProposalRecord>>,
}

impl ProposalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ProposalKey) -> Option<&ProposalRecord> {
        self.partitions
            .get(&key.proposer)
            .and_then(|partition| partition.get(&key.proposal_name))
    }

    pub fn contains(&self, key: &ProposalKey) -> bool {
        self.get(key).is_some()
    }

    /// Store a new proposal. Returns `false` (and stores nothing) if the key is taken.
    pub fn insert(&mut self, proposer: Name, record: ProposalRecord) -> bool {
        let partition = self.partitions.entry(proposer).or_default();
        if partition.contains_key(&record.proposal_name) {
            return false;
        }
        partition.insert(record.proposal_name, record);
        true
    }

    pub fn remove(&mut self, key: &ProposalKey) -> Option<ProposalRecord> {
        let partition = self.partitions.get_mut(&key.proposer)?;
        let removed = partition.remove(&key.proposal_name);
        if partition.is_empty() {
            self.partitions.remove(&key.proposer);
        }
        removed
    }

    /// All proposals of one proposer, ordered by name.
    pub fn by_proposer(&self, proposer: Name) -> impl Iterator<Item = &ProposalRecord> {
        self.partitions
            .get(&proposer)
            .into_iter()
            .flat_map(|partition| partition.values())
    }

    /// Every stored key.
    pub fn keys(&self) -> impl Iterator<Item = ProposalKey> + '_ {
        self.partitions.iter().flat_map(|(proposer, partition)| {
            partition
                .keys()
                .map(move |name| ProposalKey::new(*proposer, *name))
        })
    }

    pub fn len(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
