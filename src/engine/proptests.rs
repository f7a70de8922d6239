//! Property-based tests for the proposal engine.
//!
//! Arbitrary interleavings of approve/unapprove/invalidate/exec/cancel over
//! a small universe of authorities must keep each proposal's requested and
//! provided sets disjoint and within the originally requested set.

use super::proposal::ProposalEngine;
use crate::error::MsigError;
use crate::host::mock::{MockExecutor, MockOracle};
use crate::host::{ManualClock, SignedBy};
use crate::transaction::{Transaction, TransactionHeader};
use crate::types::{Name, PermissionLevel, ProposalKey, TimePoint, TimePointSec};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::time::Duration;

const ACTORS: [&str; 4] = ["bob", "carol", "dave", "mallory"];

#[derive(Debug, Clone)]
enum Op {
    Approve(usize),
    Unapprove(usize),
    Invalidate(usize),
    Exec,
    CancelByProposer,
    Tick(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ACTORS.len()).prop_map(Op::Approve),
        2 => (0..ACTORS.len()).prop_map(Op::Unapprove),
        1 => (0..ACTORS.len()).prop_map(Op::Invalidate),
        1 => Just(Op::Exec),
        1 => Just(Op::CancelByProposer),
        2 => (1u64..5).prop_map(Op::Tick),
    ]
}

fn level(actor: &str) -> PermissionLevel {
    PermissionLevel::new(actor.parse().unwrap(), "active".parse().unwrap())
}

fn name(s: &str) -> Name {
    s.parse().unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    /// Property: requested and provided stay disjoint and inside the original request
    #[test]
    fn approval_sets_stay_disjoint(
        requested_mask in 1u8..8,
        ops in prop::collection::vec(op_strategy(), 0..40),
    ) {
        // mallory (index 3) is never requested
        let requested: Vec<PermissionLevel> = ACTORS[..3]
            .iter()
            .enumerate()
            .filter(|(i, _)| requested_mask & (1 << i) != 0)
            .map(|(_, a)| level(a))
            .collect();
        let original: BTreeSet<PermissionLevel> = requested.iter().copied().collect();

        let clock = ManualClock::at(TimePoint::from_secs(100));
        let mut engine = ProposalEngine::new(
            MockOracle::requiring(requested.clone()),
            MockExecutor::new(),
            clock.clone(),
        );
        let key = ProposalKey::new(name("alice"), name("p1"));
        let trx = Transaction::new(
            TransactionHeader::expiring_at(TimePointSec::from_secs(1_000_000)),
            vec![],
        )
        .pack()
        .unwrap();

        let rt = runtime();
        rt.block_on(async {
            engine
                .propose(
                    &SignedBy::level(level("alice")),
                    key.proposer,
                    key.proposal_name,
                    requested.clone(),
                    trx,
                )
                .await
        })
        .unwrap();

        for op in ops {
            let result = rt.block_on(async {
                match op {
                    Op::Approve(i) => {
                        engine
                            .approve(&SignedBy::level(level(ACTORS[i])), key.proposer, key.proposal_name, level(ACTORS[i]), None)
                            .await
                    }
                    Op::Unapprove(i) => {
                        engine
                            .unapprove(&SignedBy::level(level(ACTORS[i])), key.proposer, key.proposal_name, level(ACTORS[i]))
                            .await
                    }
                    Op::Invalidate(i) => {
                        engine
                            .invalidate(&SignedBy::level(level(ACTORS[i])), name(ACTORS[i]))
                            .await
                    }
                    Op::Exec => {
                        engine
                            .exec(&SignedBy::level(level("erin")), key.proposer, key.proposal_name, name("erin"))
                            .await
                    }
                    Op::CancelByProposer => {
                        engine
                            .cancel(&SignedBy::level(level("alice")), key.proposer, key.proposal_name, key.proposer)
                            .await
                    }
                    Op::Tick(secs) => {
                        clock.advance(Duration::from_secs(secs));
                        Ok(())
                    }
                }
            });

            if let Err(e) = &result {
                prop_assert!(
                    matches!(
                        e,
                        MsigError::NotFound(_)
                            | MsigError::NotRequested { .. }
                            | MsigError::NotApproved { .. }
                            | MsigError::AuthorizationInsufficient
                    ),
                    "unexpected error: {}",
                    e
                );
            }

            // Proposal and approvals exist together or not at all.
            prop_assert_eq!(engine.proposal(&key).is_some(), engine.approvals(&key).is_some());

            if let Some(info) = engine.approvals(&key) {
                let req: BTreeSet<PermissionLevel> =
                    info.requested_approvals.iter().map(|a| a.level).collect();
                let prov: BTreeSet<PermissionLevel> =
                    info.provided_approvals.iter().map(|a| a.level).collect();

                prop_assert_eq!(req.len(), info.requested_approvals.len());
                prop_assert_eq!(prov.len(), info.provided_approvals.len());
                prop_assert!(req.is_disjoint(&prov));
                let union: BTreeSet<PermissionLevel> = req.union(&prov).copied().collect();
                prop_assert_eq!(union, original.clone());
            }
        }
    }

    /// Property: an invalidation at or after every grant makes exec fail
    #[test]
    fn invalidation_voids_all_earlier_grants(
        gap_secs in 0u64..10,
    ) {
        let clock = ManualClock::at(TimePoint::from_secs(100));
        let executor = MockExecutor::new();
        let mut engine = ProposalEngine::new(
            MockOracle::requiring([level("bob")]),
            executor.clone(),
            clock.clone(),
        );
        let trx = Transaction::new(
            TransactionHeader::expiring_at(TimePointSec::from_secs(1_000_000)),
            vec![],
        )
        .pack()
        .unwrap();
        let bob = SignedBy::level(level("bob"));

        let rt = runtime();
        let result = rt.block_on(async {
            // Several proposals all approved by bob.
            for proposal in ["p1", "p2", "p3"] {
                engine
                    .propose(&SignedBy::level(level("alice")), name("alice"), name(proposal), vec![level("bob")], trx.clone())
                    .await?;
                engine
                    .approve(&bob, name("alice"), name(proposal), level("bob"), None)
                    .await?;
            }
            clock.advance(Duration::from_secs(gap_secs));
            engine.invalidate(&bob, name("bob")).await?;

            let mut outcomes = Vec::new();
            for proposal in ["p1", "p2", "p3"] {
                outcomes.push(
                    engine
                        .exec(&SignedBy::level(level("erin")), name("alice"), name(proposal), name("erin"))
                        .await,
                );
            }
            Ok::<_, MsigError>(outcomes)
        });

        for outcome in result.unwrap() {
            prop_assert!(matches!(outcome, Err(MsigError::AuthorizationInsufficient)));
        }
        prop_assert!(executor.submissions().is_empty());
    }
}
