//! Authorization oracle that checks declared action authorities.
//!
//! Answers affirmatively when every `actor@permission` declared by the
//! transaction's actions is present in the candidate set. Permission
//! hierarchies and key weights are not resolved: a parent permission does
//! not stand in for a child.

use async_trait::async_trait;
use std::collections::BTreeSet;

use super::traits::{AuthorizationOracle, HostError, HostResult};
use crate::transaction::Transaction;
use crate::types::PermissionLevel;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredAuthorizationOracle;

#[async_trait]
impl AuthorizationOracle for DeclaredAuthorizationOracle {
    async fn check_authorization(
        &self,
        packed_trx: &[u8],
        levels: &[PermissionLevel],
    ) -> HostResult<bool> {
        let trx = Transaction::unpack(packed_trx)
            .map_err(|e| HostError::OracleUnavailable(format!("cannot decode transaction: {}", e)))?;

        let declared = trx.declared_authorizations();
        if declared.is_empty() {
            return Ok(false);
        }

        let provided: BTreeSet<&PermissionLevel> = levels.iter().collect();
        Ok(declared.iter().all(|level| provided.contains(level)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Action, TransactionHeader};
    use crate::types::TimePointSec;

    fn level(s: &str) -> PermissionLevel {
        s.parse().unwrap()
    }

    fn packed(authorization: Vec<PermissionLevel>) -> Vec<u8> {
        Transaction::new(
            TransactionHeader::expiring_at(TimePointSec::from_secs(100)),
            vec![Action {
                account: "eosio".parse().unwrap(),
                name: "updateauth".parse().unwrap(),
                authorization,
                data: vec![],
            }],
        )
        .pack()
        .unwrap()
    }

    #[tokio::test]
    async fn test_all_declared_present() {
        let trx = packed(vec![level("alice@active"), level("bob@active")]);
        let oracle = DeclaredAuthorizationOracle;

        let ok = oracle
            .check_authorization(&trx, &[level("bob@active"), level("alice@active")])
            .await
            .unwrap();
        assert!(ok);

        let extra = oracle
            .check_authorization(
                &trx,
                &[level("alice@active"), level("bob@active"), level("carol@active")],
            )
            .await
            .unwrap();
        assert!(extra);
    }

    #[tokio::test]
    async fn test_missing_declared_level() {
        let trx = packed(vec![level("alice@active"), level("bob@active")]);
        let ok = DeclaredAuthorizationOracle
            .check_authorization(&trx, &[level("alice@active")])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_no_hierarchy_resolution() {
        let trx = packed(vec![level("alice@active")]);
        let ok = DeclaredAuthorizationOracle
            .check_authorization(&trx, &[level("alice@owner")])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_transaction_without_authorities_never_authorized() {
        let trx = packed(vec![]);
        let ok = DeclaredAuthorizationOracle
            .check_authorization(&trx, &[level("alice@active")])
            .await
            .unwrap();
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_undecodable_transaction_is_host_error() {
        let result = DeclaredAuthorizationOracle
            .check_authorization(&[0xff], &[])
            .await;
        assert!(matches!(result, Err(HostError::OracleUnavailable(_))));
    }
}
