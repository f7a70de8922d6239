//! Cosign - Multi-signature transaction proposals
//!
//! A proposer stores a pending transaction together with the authorities
//! required to approve it; those authorities approve or withdraw; once the
//! live approvals satisfy the authorization oracle, anyone may execute it.
//!
//! Key principles:
//! - Sufficiency is re-checked at exec time, never trusted from approve time
//! - Every operation is all-or-nothing
//! - Invalidation is a lazy per-account watermark, not a scrub of proposals
//! - Signature checks, authority graphs and execution are host collaborators

pub mod engine;
pub mod error;
pub mod host;
pub mod serialization;
pub mod store;
pub mod transaction;
pub mod types;

pub use engine::ProposalEngine;
pub use error::{MsigError, MsigResult};
pub use types::{Name, PermissionLevel, ProposalKey, SchedulingKey, TimePoint, TimePointSec};
