//! Caller authentication from presented authorities.

use std::collections::BTreeSet;

use super::traits::Authenticator;
use crate::types::{Name, PermissionLevel};

/// The set of authorities a caller has proven control of.
///
/// Proof itself (signatures, sessions) happens before this value is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedBy {
    levels: BTreeSet<PermissionLevel>,
}

impl SignedBy {
    pub fn new(levels: impl IntoIterator<Item = PermissionLevel>) -> Self {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// Caller holding a single authority.
    pub fn level(level: PermissionLevel) -> Self {
        Self::new([level])
    }

    pub fn levels(&self) -> impl Iterator<Item = &PermissionLevel> {
        self.levels.iter()
    }
}

impl Authenticator for SignedBy {
    fn has_auth(&self, level: &PermissionLevel) -> bool {
        self.levels.contains(level)
    }

    fn has_account_auth(&self, account: Name) -> bool {
        self.levels.iter().any(|level| level.actor == account)
    }
}
