//! Mock host collaborators for testing.
//!
//! `MockOracle` answers from a scripted rule and records every query;
//! `MockExecutor` records submissions and can be told to fail.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use super::traits::*;
use crate::types::{Name, PermissionLevel, SchedulingKey};

/// How the mock oracle decides.
#[derive(Debug, Clone)]
pub enum Verdict {
    /// Always answer this.
    Fixed(bool),
    /// Affirmative iff every listed level is among the candidates.
    Requires(BTreeSet<PermissionLevel>),
    /// Oracle cannot be reached.
    Unavailable,
}

/// A recorded oracle query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleCall {
    pub packed_trx: Vec<u8>,
    pub levels: Vec<PermissionLevel>,
}

/// Mock authorization oracle.
#[derive(Clone)]
pub struct MockOracle {
    state: Arc<Mutex<MockOracleState>>,
}

struct MockOracleState {
    verdict: Verdict,
    calls: Vec<OracleCall>,
}

impl MockOracle {
    pub fn new(verdict: Verdict) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockOracleState {
                verdict,
                calls: Vec::new(),
            })),
        }
    }

    /// Oracle that is satisfied exactly when all `levels` are provided.
    pub fn requiring(levels: impl IntoIterator<Item = PermissionLevel>) -> Self {
        Self::new(Verdict::Requires(levels.into_iter().collect()))
    }

    pub fn set_verdict(&self, verdict: Verdict) {
        self.state.lock().unwrap().verdict = verdict;
    }

    /// Queries received so far.
    pub fn calls(&self) -> Vec<OracleCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new(Verdict::Fixed(true))
    }
}

#[async_trait]
impl AuthorizationOracle for MockOracle {
    async fn check_authorization(
        &self,
        packed_trx: &[u8],
        levels: &[PermissionLevel],
    ) -> HostResult<bool> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(OracleCall {
            packed_trx: packed_trx.to_vec(),
            levels: levels.to_vec(),
        });

        match &state.verdict {
            Verdict::Fixed(answer) => Ok(*answer),
            Verdict::Requires(required) => Ok(required.iter().all(|l| levels.contains(l))),
            Verdict::Unavailable => Err(HostError::OracleUnavailable("mock".to_string())),
        }
    }
}

/// A recorded executor submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub key: SchedulingKey,
    pub payer: Name,
    pub packed_trx: Vec<u8>,
}

/// Mock deferred executor.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockExecutorState>>,
}

#[derive(Default)]
struct MockExecutorState {
    submissions: Vec<Submission>,
    fail: bool,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent submissions fail.
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }
}

#[async_trait]
impl DeferredExecutor for MockExecutor {
    async fn submit(&self, key: SchedulingKey, payer: Name, packed_trx: &[u8]) -> HostResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(HostError::SubmissionFailed("mock".to_string()));
        }
        state.submissions.push(Submission {
            key,
            payer,
            packed_trx: packed_trx.to_vec(),
        });
        Ok(())
    }
}
