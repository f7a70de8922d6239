//! Packed transaction format.
//!
//! A packed transaction is a CBOR-encoded `TransactionHeader` immediately
//! followed by a CBOR-encoded `TransactionBody`. Only the header is needed
//! to check expiration, so `decode_header` never touches the body.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::serialization::{append_cbor, next_cbor, to_cbor, SerializationError};
use crate::types::{Name, PermissionLevel, TimePointSec};

/// Fields that can be read without decoding the actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    pub expiration: TimePointSec,
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub max_net_usage_words: u32,
    pub max_cpu_usage_ms: u8,
    pub delay_sec: u32,
}

impl TransactionHeader {
    pub fn expiring_at(expiration: TimePointSec) -> Self {
        Self {
            expiration,
            ..Self::default()
        }
    }
}

/// A single contract call and the authorities it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub account: Name,
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    #[serde(default)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionBody {
    #[serde(default)]
    pub context_free_actions: Vec<Action>,
    pub actions: Vec<Action>,
}

/// Decoded transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub header: TransactionHeader,
    pub body: TransactionBody,
}

impl Transaction {
    pub fn new(header: TransactionHeader, actions: Vec<Action>) -> Self {
        Self {
            header,
            body: TransactionBody {
                context_free_actions: Vec::new(),
                actions,
            },
        }
    }

    /// Encode header then body.
    pub fn pack(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = to_cbor(&self.header)?;
        append_cbor(&self.body, &mut bytes)?;
        Ok(bytes)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Self, SerializationError> {
        let mut input = bytes;
        let header = next_cbor(&mut input)?;
        let body = next_cbor(&mut input)?;
        if !input.is_empty() {
            return Err(SerializationError::Decode(format!(
                "{} trailing bytes after transaction body",
                input.len()
            )));
        }
        Ok(Self { header, body })
    }

    /// Every authority declared by the transaction's actions, deduplicated.
    pub fn declared_authorizations(&self) -> Vec<PermissionLevel> {
        let mut levels: Vec<PermissionLevel> = self
            .body
            .context_free_actions
            .iter()
            .chain(self.body.actions.iter())
            .flat_map(|action| action.authorization.iter().copied())
            .collect();
        levels.sort();
        levels.dedup();
        levels
    }
}

/// Decode just the header of a packed transaction.
pub fn decode_header(packed: &[u8]) -> Result<TransactionHeader, SerializationError> {
    let mut input = packed;
    next_cbor(&mut input)
}

/// SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum256([u8; 32]);

impl Checksum256 {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Checksum256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Checksum256 {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// Digest a proposal's packed transaction.
pub fn proposal_hash(packed: &[u8]) -> Checksum256 {
    Checksum256(Sha256::digest(packed).into())
}
