//! Multisig proposal workflow.
//!
//! - propose: store a transaction and the authorities asked to approve it
//! - approve / unapprove: move one authority between requested and provided
//! - cancel: proposer any time, anyone else after expiration
//! - exec: re-check live approvals with the oracle, then schedule and consume
//! - invalidate: void every approval an account granted so far
//!
//! Sufficiency is only decided at exec time; approvals are advisory until then.

pub mod proposal;

#[cfg(test)]
mod proptests;

pub use proposal::ProposalEngine;
