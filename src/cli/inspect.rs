//! Read-only commands: show, list, queue.

use serde::Serialize;
use std::path::Path;

use cosign::host::{Clock, DeferredQueue};
use cosign::store::MultisigState;
use cosign::transaction::{decode_header, proposal_hash, Action, Transaction};
use cosign::{Name, PermissionLevel, ProposalKey, TimePoint};

use super::state_file::StateFile;

#[derive(Debug, Serialize)]
pub struct ApprovalView {
    pub level: PermissionLevel,
    pub time: TimePoint,
    /// False once the approver invalidated at or after `time`.
    pub live: bool,
}

#[derive(Debug, Serialize)]
pub struct ProposalView {
    pub proposer: Name,
    pub proposal_name: Name,
    pub hash: String,
    pub expiration: String,
    pub delay_sec: u32,
    pub actions: Vec<Action>,
    pub requested: Vec<PermissionLevel>,
    pub provided: Vec<ApprovalView>,
}

/// Assemble everything known about one proposal.
pub fn proposal_view(state: &MultisigState, key: &ProposalKey) -> Option<ProposalView> {
    let record = state.proposals.get(key)?;
    let info = state.approvals.get(key)?;

    // Best-effort: only the header is guaranteed to decode.
    let header = decode_header(&record.packed_transaction).ok();
    let actions = Transaction::unpack(&record.packed_transaction)
        .map(|trx| trx.body.actions)
        .unwrap_or_default();

    Some(ProposalView {
        proposer: key.proposer,
        proposal_name: key.proposal_name,
        hash: proposal_hash(&record.packed_transaction).to_string(),
        expiration: header
            .as_ref()
            .map(|h| h.expiration.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        delay_sec: header.map(|h| h.delay_sec).unwrap_or_default(),
        actions,
        requested: info
            .requested_approvals
            .iter()
            .map(|approval| approval.level)
            .collect(),
        provided: info
            .provided_approvals
            .iter()
            .map(|approval| ApprovalView {
                level: approval.level,
                time: approval.time,
                live: state.invalidations.is_live(approval),
            })
            .collect(),
    })
}

fn print_view(view: &ProposalView) {
    println!("{}/{}", view.proposer, view.proposal_name);
    println!("  hash:       {}", view.hash);
    println!("  expiration: {}", view.expiration);
    if view.delay_sec > 0 {
        println!("  delay:      {}s", view.delay_sec);
    }
    for action in &view.actions {
        let auths: Vec<String> = action.authorization.iter().map(|l| l.to_string()).collect();
        println!(
            "  action:     {}::{} [{}] {} bytes",
            action.account,
            action.name,
            auths.join(", "),
            action.data.len()
        );
    }
    for level in &view.requested {
        println!("  requested:  {}", level);
    }
    for approval in &view.provided {
        let marker = if approval.live { "" } else { " (invalidated)" };
        println!("  provided:   {} at {}{}", approval.level, approval.time, marker);
    }
}

pub fn show(
    state_path: &Path,
    proposer: Name,
    proposal_name: Name,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = StateFile::load(state_path)?;
    let key = ProposalKey::new(proposer, proposal_name);
    let view = proposal_view(&state.multisig, &key)
        .ok_or_else(|| format!("Proposal not found: {}", key))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

/// Proposal keys, optionally restricted to one proposer.
pub fn list_keys(state: &MultisigState, proposer: Option<Name>) -> Vec<ProposalKey> {
    state
        .proposals
        .keys()
        .filter(|key| proposer.map_or(true, |p| key.proposer == p))
        .collect()
}

pub fn list(state_path: &Path, proposer: Option<Name>) -> Result<(), Box<dyn std::error::Error>> {
    let state = StateFile::load(state_path)?;
    let keys = list_keys(&state.multisig, proposer);
    if keys.is_empty() {
        println!("no proposals");
    }
    for key in keys {
        let info = state.multisig.approvals.get(&key);
        let (requested, provided) = info
            .map(|i| (i.requested_approvals.len(), i.provided_approvals.len()))
            .unwrap_or_default();
        println!("{}  {}/{} approved", key, provided, requested + provided);
    }
    Ok(())
}

/// Show the deferred queue. With `take_due`, remove every entry whose delay
/// has elapsed and print it as released.
pub async fn queue<C: Clock + Clone>(
    state_path: &Path,
    clock: C,
    take_due: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut state = StateFile::load(state_path)?;

    if take_due {
        let queue = DeferredQueue::restore(clock.clone(), state.deferred);
        let due = queue.take_due(clock.now());
        state.deferred = queue.snapshot();
        state.save(state_path)?;

        for entry in &due {
            tracing::info!(key = %entry.key, payer = %entry.payer, "released deferred transaction");
            println!("released {} (payer {})", entry.key, entry.payer);
        }
        println!("{} released, {} pending", due.len(), state.deferred.len());
        return Ok(());
    }

    if state.deferred.is_empty() {
        println!("queue empty");
    }
    for entry in &state.deferred {
        println!(
            "{}  payer {}  after {}  {} bytes",
            entry.key,
            entry.payer,
            entry.execute_after,
            entry.packed_trx.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosign::host::{DeferredTransaction, ManualClock};
    use cosign::store::ProposalRecord;
    use cosign::transaction::TransactionHeader;
    use cosign::TimePointSec;
    use tempfile::TempDir;

    fn name(s: &str) -> Name {
        s.parse().unwrap()
    }

    fn level(s: &str) -> PermissionLevel {
        s.parse().unwrap()
    }

    fn state_with_proposal() -> (MultisigState, ProposalKey) {
        let key = ProposalKey::new(name("alice"), name("p1"));
        let packed = Transaction::new(
            TransactionHeader::expiring_at(TimePointSec::from_secs(2_000)),
            vec![Action {
                account: name("eosio"),
                name: name("updateauth"),
                authorization: vec![level("bob@active")],
                data: vec![],
            }],
        )
        .pack()
        .unwrap();

        let mut state = MultisigState::new();
        state.proposals.insert(
            key.proposer,
            ProposalRecord {
                proposal_name: key.proposal_name,
                packed_transaction: packed,
            },
        );
        state
            .approvals
            .open(&key, &[level("bob@active"), level("carol@active")]);
        state
            .approvals
            .approve(&key, &level("bob@active"), TimePoint::from_secs(10));
        (state, key)
    }

    #[test]
    fn test_view_marks_invalidated_approvals() {
        let (mut state, key) = state_with_proposal();

        let view = proposal_view(&state, &key).unwrap();
        assert_eq!(view.requested, vec![level("carol@active")]);
        assert_eq!(view.provided.len(), 1);
        assert!(view.provided[0].live);
        assert_eq!(view.actions.len(), 1);

        state.invalidations.invalidate(name("bob"), TimePoint::from_secs(10));
        let view = proposal_view(&state, &key).unwrap();
        assert!(!view.provided[0].live);
    }

    #[test]
    fn test_view_serializes_to_json() {
        let (state, key) = state_with_proposal();
        let view = proposal_view(&state, &key).unwrap();
        let json: serde_json::Value = serde_json::to_value(&view).unwrap();

        assert_eq!(json["proposer"], "alice");
        assert_eq!(json["provided"][0]["level"]["actor"], "bob");
        assert_eq!(json["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_view_missing_proposal() {
        let (state, _) = state_with_proposal();
        let other = ProposalKey::new(name("alice"), name("p2"));
        assert!(proposal_view(&state, &other).is_none());
    }

    #[test]
    fn test_list_keys_filters_by_proposer() {
        let (mut state, key) = state_with_proposal();
        state.proposals.insert(
            name("zed"),
            ProposalRecord {
                proposal_name: name("p9"),
                packed_transaction: vec![],
            },
        );

        assert_eq!(list_keys(&state, None).len(), 2);
        assert_eq!(list_keys(&state, Some(name("alice"))), vec![key]);
        assert!(list_keys(&state, Some(name("nobody"))).is_empty());
    }

    #[tokio::test]
    async fn test_queue_take_due_releases_elapsed_entries() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.cbor");
        let clock = ManualClock::at(TimePoint::from_secs(100));

        let entry = |proposal: &str, after: u32| DeferredTransaction {
            key: ProposalKey::new(name("alice"), name(proposal)).scheduling_key(),
            payer: name("bob"),
            packed_trx: vec![],
            execute_after: TimePoint::from_secs(after),
        };
        StateFile {
            multisig: MultisigState::new(),
            deferred: vec![entry("p1", 50), entry("p2", 500)],
        }
        .save(&path)
        .unwrap();

        queue(&path, clock.clone(), true).await.unwrap();

        let saved = StateFile::load(&path).unwrap();
        assert_eq!(saved.deferred, vec![entry("p2", 500)]);
    }
}
