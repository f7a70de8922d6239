//! In-memory deferred execution queue.
//!
//! Holds transactions handed over by `exec` until something drains them.
//! Submissions are keyed: a second submission under a key that is still
//! pending replaces the first rather than queueing a duplicate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{Clock, DeferredExecutor, HostError, HostResult};
use crate::transaction::decode_header;
use crate::types::{Name, SchedulingKey, TimePoint};

/// A scheduled transaction waiting to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredTransaction {
    pub key: SchedulingKey,
    /// Account charged for the deferred run.
    pub payer: Name,
    pub packed_trx: Vec<u8>,
    /// Earliest time the transaction may run (submission time + header delay).
    pub execute_after: TimePoint,
}

/// Replace-by-key queue of deferred transactions.
#[derive(Clone)]
pub struct DeferredQueue<C: Clock> {
    pending: Arc<Mutex<BTreeMap<SchedulingKey, DeferredTransaction>>>,
    clock: C,
}

impl<C: Clock> DeferredQueue<C> {
    pub fn new(clock: C) -> Self {
        Self {
            pending: Arc::new(Mutex::new(BTreeMap::new())),
            clock,
        }
    }

    /// Rebuild a queue from a snapshot taken with `snapshot`.
    pub fn restore(clock: C, entries: Vec<DeferredTransaction>) -> Self {
        let queue = Self::new(clock);
        {
            let mut pending = queue.lock();
            for entry in entries {
                pending.insert(entry.key, entry);
            }
        }
        queue
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SchedulingKey, DeferredTransaction>> {
        // Every critical section is a single map call.
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: SchedulingKey) -> Option<DeferredTransaction> {
        self.lock().get(&key).cloned()
    }

    /// All pending transactions ordered by key.
    pub fn pending(&self) -> Vec<DeferredTransaction> {
        self.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return every transaction whose delay has elapsed at `now`.
    pub fn take_due(&self, now: TimePoint) -> Vec<DeferredTransaction> {
        let mut pending = self.lock();
        let due: Vec<SchedulingKey> = pending
            .values()
            .filter(|entry| entry.execute_after <= now)
            .map(|entry| entry.key)
            .collect();
        due.into_iter()
            .filter_map(|key| pending.remove(&key))
            .collect()
    }

    pub fn snapshot(&self) -> Vec<DeferredTransaction> {
        self.pending()
    }
}

#[async_trait]
impl<C: Clock> DeferredExecutor for DeferredQueue<C> {
    async fn submit(&self, key: SchedulingKey, payer: Name, packed_trx: &[u8]) -> HostResult<()> {
        let header = decode_header(packed_trx)
            .map_err(|e| HostError::SubmissionFailed(format!("unreadable header: {}", e)))?;
        let execute_after = self
            .clock
            .now()
            .saturating_add(std::time::Duration::from_secs(u64::from(header.delay_sec)));

        let replaced = self.lock().insert(
            key,
            DeferredTransaction {
                key,
                payer,
                packed_trx: packed_trx.to_vec(),
                execute_after,
            },
        );

        if replaced.is_some() {
            tracing::debug!(%key, %payer, "replaced pending deferred transaction");
        } else {
            tracing::debug!(%key, %payer, "scheduled deferred transaction");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::clock::ManualClock;
    use crate::transaction::{Transaction, TransactionHeader};
    use crate::types::TimePointSec;

    fn packed(delay_sec: u32, marker: u32) -> Vec<u8> {
        let header = TransactionHeader {
            expiration: TimePointSec::from_secs(10_000),
            ref_block_prefix: marker,
            delay_sec,
            ..TransactionHeader::default()
        };
        Transaction::new(header, vec![]).pack().unwrap()
    }

    fn payer() -> Name {
        "alice".parse().unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_get() {
        let clock = ManualClock::at(TimePoint::from_secs(100));
        let queue = DeferredQueue::new(clock);
        let key = SchedulingKey(7);

        queue.submit(key, payer(), &packed(0, 1)).await.unwrap();

        let entry = queue.get(key).unwrap();
        assert_eq!(entry.payer, payer());
        assert_eq!(entry.execute_after, TimePoint::from_secs(100));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_same_key_replaces() {
        let queue = DeferredQueue::new(ManualClock::at(TimePoint::ZERO));
        let key = SchedulingKey(7);

        queue.submit(key, payer(), &packed(0, 1)).await.unwrap();
        queue
            .submit(key, "bob".parse().unwrap(), &packed(0, 2))
            .await
            .unwrap();

        assert_eq!(queue.len(), 1);
        let entry = queue.get(key).unwrap();
        assert_eq!(entry.payer, "bob".parse::<Name>().unwrap());
        assert_eq!(entry.packed_trx, packed(0, 2));
    }

    #[tokio::test]
    async fn test_take_due_respects_delay() {
        let clock = ManualClock::at(TimePoint::from_secs(100));
        let queue = DeferredQueue::new(clock.clone());

        queue.submit(SchedulingKey(1), payer(), &packed(0, 1)).await.unwrap();
        queue.submit(SchedulingKey(2), payer(), &packed(60, 2)).await.unwrap();

        let due = queue.take_due(clock.now());
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, SchedulingKey(1));
        assert_eq!(queue.len(), 1);

        clock.advance(std::time::Duration::from_secs(60));
        let due = queue.take_due(clock.now());
        assert_eq!(due.len(), 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_unreadable_header() {
        let queue = DeferredQueue::new(ManualClock::at(TimePoint::ZERO));
        let result = queue.submit(SchedulingKey(1), payer(), &[0xff]).await;
        assert!(matches!(result, Err(HostError::SubmissionFailed(_))));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_restore() {
        let clock = ManualClock::at(TimePoint::ZERO);
        let queue = DeferredQueue::new(clock.clone());
        queue.submit(SchedulingKey(1), payer(), &packed(0, 1)).await.unwrap();
        queue.submit(SchedulingKey(2), payer(), &packed(0, 2)).await.unwrap();

        let restored = DeferredQueue::restore(clock, queue.snapshot());
        assert_eq!(restored.pending(), queue.pending());
    }
}
