//! Proposal engine: the six multisig operations.
//!
//! Each operation checks every precondition (authentication, existence,
//! content, oracle verdict, executor submission) before touching a store,
//! so a rejected call leaves the state exactly as it found it. Methods take
//! `&mut self`, which serializes invocations.

use tracing::{debug, info};

use crate::error::{MsigError, MsigResult};
use crate::host::{Authenticator, AuthorizationOracle, Clock, DeferredExecutor};
use crate::store::{ApprovalsInfo, Invalidation, MultisigState, ProposalRecord};
use crate::transaction::{decode_header, proposal_hash, Checksum256};
use crate::types::{Name, PermissionLevel, ProposalKey};

pub struct ProposalEngine<O, X, C> {
    state: MultisigState,
    oracle: O,
    executor: X,
    clock: C,
}

fn require_account(caller: &impl Authenticator, account: Name) -> MsigResult<()> {
    if caller.has_account_auth(account) {
        Ok(())
    } else {
        Err(MsigError::AuthenticationFailed(account.to_string()))
    }
}

fn require_level(caller: &impl Authenticator, level: &PermissionLevel) -> MsigResult<()> {
    if caller.has_auth(level) {
        Ok(())
    } else {
        Err(MsigError::AuthenticationFailed(level.to_string()))
    }
}

impl<O, X, C> ProposalEngine<O, X, C>
where
    O: AuthorizationOracle,
    X: DeferredExecutor,
    C: Clock,
{
    pub fn new(oracle: O, executor: X, clock: C) -> Self {
        Self::with_state(MultisigState::new(), oracle, executor, clock)
    }

    /// Resume from previously persisted state.
    pub fn with_state(state: MultisigState, oracle: O, executor: X, clock: C) -> Self {
        Self {
            state,
            oracle,
            executor,
            clock,
        }
    }

    /// Store a pending transaction together with the authorities asked to approve it.
    pub async fn propose(
        &mut self,
        caller: &impl Authenticator,
        proposer: Name,
        proposal_name: Name,
        requested: Vec<PermissionLevel>,
        packed_trx: Vec<u8>,
    ) -> MsigResult<()> {
        require_account(caller, proposer)?;

        let header = decode_header(&packed_trx)?;
        let now = self.clock.now();
        if header.expiration < now.to_sec() {
            return Err(MsigError::TransactionExpired);
        }

        let key = ProposalKey::new(proposer, proposal_name);
        if self.state.proposals.contains(&key) {
            return Err(MsigError::DuplicateProposal(key));
        }

        if !self
            .oracle
            .check_authorization(&packed_trx, &requested)
            .await?
        {
            return Err(MsigError::AuthorizationMismatch);
        }

        self.state.proposals.insert(
            proposer,
            ProposalRecord {
                proposal_name,
                packed_transaction: packed_trx,
            },
        );
        self.state.approvals.open(&key, &requested);

        info!(
            %proposer,
            proposal = %proposal_name,
            requested = requested.len(),
            expiration = %header.expiration,
            "proposal created"
        );
        Ok(())
    }

    /// Grant `level`'s approval. When `expected_hash` is given it must match
    /// the digest of the stored transaction.
    pub async fn approve(
        &mut self,
        caller: &impl Authenticator,
        proposer: Name,
        proposal_name: Name,
        level: PermissionLevel,
        expected_hash: Option<Checksum256>,
    ) -> MsigResult<()> {
        require_level(caller, &level)?;

        let key = ProposalKey::new(proposer, proposal_name);
        let record = self
            .state
            .proposals
            .get(&key)
            .ok_or(MsigError::NotFound(key))?;

        if let Some(expected) = expected_hash {
            let actual = proposal_hash(&record.packed_transaction);
            if actual != expected {
                debug!(%key, %expected, %actual, "proposal hash mismatch");
                return Err(MsigError::ProposalMismatch(key));
            }
        }

        if self.state.approvals.get(&key).is_none() {
            return Err(MsigError::NotFound(key));
        }

        let now = self.clock.now();
        if !self.state.approvals.approve(&key, &level, now) {
            return Err(MsigError::NotRequested { key, level });
        }

        info!(%key, %level, "approval granted");
        Ok(())
    }

    /// Withdraw a previously granted approval.
    pub async fn unapprove(
        &mut self,
        caller: &impl Authenticator,
        proposer: Name,
        proposal_name: Name,
        level: PermissionLevel,
    ) -> MsigResult<()> {
        require_level(caller, &level)?;

        let key = ProposalKey::new(proposer, proposal_name);
        if self.state.approvals.get(&key).is_none() {
            return Err(MsigError::NotFound(key));
        }

        let now = self.clock.now();
        if !self.state.approvals.unapprove(&key, &level, now) {
            return Err(MsigError::NotApproved { key, level });
        }

        info!(%key, %level, "approval withdrawn");
        Ok(())
    }

    /// Delete a proposal. Anyone but the proposer must wait for it to expire.
    pub async fn cancel(
        &mut self,
        caller: &impl Authenticator,
        proposer: Name,
        proposal_name: Name,
        canceler: Name,
    ) -> MsigResult<()> {
        require_account(caller, canceler)?;

        let key = ProposalKey::new(proposer, proposal_name);
        let record = self
            .state
            .proposals
            .get(&key)
            .ok_or(MsigError::NotFound(key))?;

        if canceler != proposer {
            let header = decode_header(&record.packed_transaction)?;
            if header.expiration >= self.clock.now().to_sec() {
                return Err(MsigError::NotYetCancelable(key));
            }
        }

        self.state.proposals.remove(&key);
        self.state.approvals.remove(&key);

        info!(%key, %canceler, "proposal canceled");
        Ok(())
    }

    /// Re-check sufficiency of the live approvals and hand the transaction
    /// to the deferred executor. The proposal is consumed on success.
    pub async fn exec(
        &mut self,
        caller: &impl Authenticator,
        proposer: Name,
        proposal_name: Name,
        executer: Name,
    ) -> MsigResult<()> {
        require_account(caller, executer)?;

        let key = ProposalKey::new(proposer, proposal_name);
        let record = self
            .state
            .proposals
            .get(&key)
            .ok_or(MsigError::NotFound(key))?;

        let header = decode_header(&record.packed_transaction)?;
        if header.expiration < self.clock.now().to_sec() {
            return Err(MsigError::TransactionExpired);
        }

        let info = self
            .state
            .approvals
            .get(&key)
            .ok_or(MsigError::NotFound(key))?;
        let live: Vec<PermissionLevel> = info
            .provided_approvals
            .iter()
            .filter(|approval| self.state.invalidations.is_live(approval))
            .map(|approval| approval.level)
            .collect();

        if !self
            .oracle
            .check_authorization(&record.packed_transaction, &live)
            .await?
        {
            debug!(
                %key,
                provided = info.provided_approvals.len(),
                live = live.len(),
                "live approvals do not authorize transaction"
            );
            return Err(MsigError::AuthorizationInsufficient);
        }

        let scheduling_key = key.scheduling_key();
        self.executor
            .submit(scheduling_key, executer, &record.packed_transaction)
            .await?;

        self.state.proposals.remove(&key);
        self.state.approvals.remove(&key);

        info!(%key, %executer, %scheduling_key, approvals = live.len(), "proposal executed");
        Ok(())
    }

    /// Void every approval `account` has granted up to now.
    pub async fn invalidate(&mut self, caller: &impl Authenticator, account: Name) -> MsigResult<()> {
        require_account(caller, account)?;

        let now = self.clock.now();
        self.state.invalidations.invalidate(account, now);

        info!(%account, at = %now, "approvals invalidated");
        Ok(())
    }

    pub fn proposal(&self, key: &ProposalKey) -> Option<&ProposalRecord> {
        self.state.proposals.get(key)
    }

    pub fn approvals(&self, key: &ProposalKey) -> Option<&ApprovalsInfo> {
        self.state.approvals.get(key)
    }

    /// Provided approvals that would count if the proposal executed now.
    pub fn live_approvals(&self, key: &ProposalKey) -> Option<Vec<PermissionLevel>> {
        let info = self.state.approvals.get(key)?;
        Some(
            info.provided_approvals
                .iter()
                .filter(|approval| self.state.invalidations.is_live(approval))
                .map(|approval| approval.level)
                .collect(),
        )
    }

    pub fn invalidation(&self, account: Name) -> Option<&Invalidation> {
        self.state.invalidations.get(account)
    }

    pub fn proposals_by(&self, proposer: Name) -> impl Iterator<Item = &ProposalRecord> {
        self.state.proposals.by_proposer(proposer)
    }

    pub fn state(&self) -> &MultisigState {
        &self.state
    }

    pub fn into_state(self) -> MultisigState {
        self.state
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
