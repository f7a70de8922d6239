//! Mutating commands: propose, approve, unapprove, cancel, exec, invalidate.
//!
//! Each command loads the state file, runs one engine operation as the
//! authorities given with `--auth`, and saves only if the operation
//! succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use cosign::host::{Clock, DeclaredAuthorizationOracle, DeferredQueue, SignedBy};
use cosign::transaction::Checksum256;
use cosign::{MsigResult, Name, PermissionLevel, ProposalEngine};

use super::state_file::StateFile;

/// One engine operation, as parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Propose {
        proposer: Name,
        proposal_name: Name,
        requested: Vec<PermissionLevel>,
        trx_file: PathBuf,
    },
    Approve {
        proposer: Name,
        proposal_name: Name,
        level: PermissionLevel,
        hash: Option<Checksum256>,
    },
    Unapprove {
        proposer: Name,
        proposal_name: Name,
        level: PermissionLevel,
    },
    Cancel {
        proposer: Name,
        proposal_name: Name,
        canceler: Name,
    },
    Exec {
        proposer: Name,
        proposal_name: Name,
        executer: Name,
    },
    Invalidate {
        account: Name,
    },
}

type CliEngine<C> = ProposalEngine<DeclaredAuthorizationOracle, DeferredQueue<C>, C>;

async fn apply<C: Clock>(
    engine: &mut CliEngine<C>,
    caller: &SignedBy,
    op: Operation,
    packed_trx: Option<Vec<u8>>,
) -> MsigResult<String> {
    match op {
        Operation::Propose {
            proposer,
            proposal_name,
            requested,
            ..
        } => {
            let count = requested.len();
            engine
                .propose(
                    caller,
                    proposer,
                    proposal_name,
                    requested,
                    packed_trx.unwrap_or_default(),
                )
                .await?;
            Ok(format!(
                "proposed {}/{} ({} approvals requested)",
                proposer, proposal_name, count
            ))
        }
        Operation::Approve {
            proposer,
            proposal_name,
            level,
            hash,
        } => {
            engine
                .approve(caller, proposer, proposal_name, level, hash)
                .await?;
            Ok(format!("{} approved {}/{}", level, proposer, proposal_name))
        }
        Operation::Unapprove {
            proposer,
            proposal_name,
            level,
        } => {
            engine
                .unapprove(caller, proposer, proposal_name, level)
                .await?;
            Ok(format!("{} unapproved {}/{}", level, proposer, proposal_name))
        }
        Operation::Cancel {
            proposer,
            proposal_name,
            canceler,
        } => {
            engine
                .cancel(caller, proposer, proposal_name, canceler)
                .await?;
            Ok(format!("canceled {}/{}", proposer, proposal_name))
        }
        Operation::Exec {
            proposer,
            proposal_name,
            executer,
        } => {
            engine
                .exec(caller, proposer, proposal_name, executer)
                .await?;
            Ok(format!(
                "executed {}/{}, scheduled under {}",
                proposer,
                proposal_name,
                cosign::ProposalKey::new(proposer, proposal_name).scheduling_key()
            ))
        }
        Operation::Invalidate { account } => {
            engine.invalidate(caller, account).await?;
            Ok(format!("invalidated all approvals granted by {}", account))
        }
    }
}

/// Load state, apply `op` as `auth`, save on success. Returns the summary line.
pub async fn run<C: Clock + Clone>(
    state_path: &Path,
    clock: C,
    auth: Vec<PermissionLevel>,
    op: Operation,
) -> Result<String, Box<dyn std::error::Error>> {
    let packed_trx = match &op {
        Operation::Propose { trx_file, .. } => Some(fs::read(trx_file).map_err(|e| {
            format!(
                "Failed to read transaction file '{}': {}",
                trx_file.display(),
                e
            )
        })?),
        _ => None,
    };

    let state = StateFile::load(state_path)?;
    let queue = DeferredQueue::restore(clock.clone(), state.deferred);
    let mut engine = ProposalEngine::with_state(
        state.multisig,
        DeclaredAuthorizationOracle,
        queue.clone(),
        clock,
    );

    let caller = SignedBy::new(auth);
    let summary = apply(&mut engine, &caller, op, packed_trx).await?;

    StateFile {
        multisig: engine.into_state(),
        deferred: queue.snapshot(),
    }
    .save(state_path)?;

    Ok(summary)
}

pub async fn execute<C: Clock + Clone>(
    state_path: &Path,
    clock: C,
    auth: Vec<PermissionLevel>,
    op: Operation,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run(state_path, clock, auth, op).await?;
    println!("{}", summary);
    Ok(())
}
