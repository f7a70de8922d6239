//! Rejections raised by the proposal engine.
//!
//! Every variant is a caller-correctable precondition failure: the
//! operation that raised it left all stores untouched.

use crate::serialization::SerializationError;
use crate::types::{PermissionLevel, ProposalKey};

/// Result type for proposal engine operations.
pub type MsigResult<T> = Result<T, MsigError>;

/// Proposal engine errors.
#[derive(Debug, thiserror::Error)]
pub enum MsigError {
    #[error("Missing required authority: {0}")]
    AuthenticationFailed(String),

    #[error("Proposal with the same name exists: {0}")]
    DuplicateProposal(ProposalKey),

    #[error("Proposal not found: {0}")]
    NotFound(ProposalKey),

    #[error("Proposal hash mismatch for {0}")]
    ProposalMismatch(ProposalKey),

    #[error("Approval of {level} is not on the list of requested approvals for {key}")]
    NotRequested {
        key: ProposalKey,
        level: PermissionLevel,
    },

    #[error("No approval previously granted by {level} for {key}")]
    NotApproved {
        key: ProposalKey,
        level: PermissionLevel,
    },

    #[error("Cannot cancel {0} until expiration")]
    NotYetCancelable(ProposalKey),

    #[error("Transaction expired")]
    TransactionExpired,

    #[error("Requested authorities do not authorize the transaction")]
    AuthorizationMismatch,

    #[error("Transaction authorization failed: provided approvals are insufficient")]
    AuthorizationInsufficient,

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Malformed packed transaction: {0}")]
    Decode(#[from] SerializationError),

    #[error("Host error: {0}")]
    Host(#[from] crate::host::HostError),
}
