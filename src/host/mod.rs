//! Host collaborators consumed by the proposal engine.
//!
//! - Authentication of the caller's claimed authorities
//! - Authorization oracle (does a set of authorities satisfy a transaction?)
//! - Deferred executor (replace-by-key scheduling)
//! - Clock
//!
//! Each is a trait so the engine can be driven by mocks in tests.

pub mod auth;
pub mod clock;
pub mod declared;
pub mod deferred;
pub mod mock;
pub mod traits;

pub use auth::SignedBy;
pub use clock::{ManualClock, SystemClock};
pub use declared::DeclaredAuthorizationOracle;
pub use deferred::{DeferredQueue, DeferredTransaction};
pub use traits::{
    Authenticator, AuthorizationOracle, Clock, DeferredExecutor, HostError, HostResult,
};
