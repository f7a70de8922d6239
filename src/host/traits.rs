//! Trait abstractions for the collaborators the proposal engine consumes.
//!
//! The engine never verifies signatures, resolves authority graphs or runs
//! transactions itself; it asks these traits. Mock implementations live in
//! `host::mock` for unit testing.

use async_trait::async_trait;

use crate::types::{Name, PermissionLevel, SchedulingKey, TimePoint};

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Host collaborator errors.
///
/// These mean the collaborator could not answer, not that it answered "no".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Authorization oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Deferred executor rejected submission: {0}")]
    SubmissionFailed(String),
}

/// Verifies that the current caller controls a claimed authority.
pub trait Authenticator {
    /// Caller holds exactly this `actor@permission`.
    fn has_auth(&self, level: &PermissionLevel) -> bool;

    /// Caller holds some permission of `account`.
    fn has_account_auth(&self, account: Name) -> bool;
}

/// Decides whether a set of authorities suffices to authorize a transaction.
#[async_trait]
pub trait AuthorizationOracle: Send + Sync {
    /// `Ok(true)` when `levels` satisfy `packed_trx` under the current
    /// authority configuration.
    async fn check_authorization(
        &self,
        packed_trx: &[u8],
        levels: &[PermissionLevel],
    ) -> HostResult<bool>;
}

/// Schedules transactions for asynchronous execution.
#[async_trait]
pub trait DeferredExecutor: Send + Sync {
    /// Schedule `packed_trx`, charging `payer`. A pending submission under
    /// the same `key` is replaced.
    async fn submit(&self, key: SchedulingKey, payer: Name, packed_trx: &[u8]) -> HostResult<()>;
}

/// Time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimePoint;
}
