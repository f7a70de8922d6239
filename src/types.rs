//! Core identifiers shared by every store and the proposal engine.
//!
//! - `Name`: short base-32 identifier packed into a `u64`
//! - `PermissionLevel`: `actor@permission` pair an approval is granted under
//! - `TimePoint` / `TimePointSec`: microsecond and second resolution timestamps
//! - `ProposalKey` / `SchedulingKey`: proposal identity and its deferred-execution key

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::MsigError;

/// Symbol table for `Name`. Index 0 (`.`) is the padding symbol.
const NAME_CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum encoded length of a `Name` (12 five-bit symbols + one four-bit symbol).
const NAME_MAX_LEN: usize = 13;

/// Short identifier for accounts, permissions, proposals and actions.
///
/// Up to 12 symbols from `.12345a-z` are packed 5 bits each from the most
/// significant end; a 13th symbol may use only the first 16 alphabet entries
/// (`.12345a-j`) and occupies the low 4 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

impl Name {
    /// Wrap an already-encoded value.
    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    /// Raw encoded value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse a textual name, rejecting anything that would not round-trip.
    pub fn new(s: &str) -> Result<Self, MsigError> {
        if s.len() > NAME_MAX_LEN {
            return Err(MsigError::InvalidName(format!(
                "'{}' is longer than {} characters",
                s, NAME_MAX_LEN
            )));
        }

        let mut value = 0u64;
        for (i, c) in s.bytes().enumerate() {
            let symbol = symbol_of(c).ok_or_else(|| {
                MsigError::InvalidName(format!("'{}' contains invalid character '{}'", s, c as char))
            })?;

            if i < NAME_MAX_LEN - 1 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(MsigError::InvalidName(format!(
                        "'{}': thirteenth character must be one of .12345abcdefghij",
                        s
                    )));
                }
                value |= symbol;
            }
        }

        Ok(Self(value))
    }
}

fn symbol_of(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; NAME_MAX_LEN];
        let mut tmp = self.0;
        for i in 0..NAME_MAX_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[NAME_MAX_LEN - 1 - i] = NAME_CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }

        let end = out.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
        // Every byte comes from NAME_CHARMAP, which is ASCII.
        f.write_str(std::str::from_utf8(&out[..end]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Name {
    type Err = MsigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Name::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An account together with one of its permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

impl PermissionLevel {
    pub fn new(actor: Name, permission: Name) -> Self {
        Self { actor, permission }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.permission)
    }
}

impl FromStr for PermissionLevel {
    type Err = MsigError;

    /// Parse `actor@permission`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (actor, permission) = s.split_once('@').ok_or_else(|| {
            MsigError::InvalidName(format!("'{}' is not of the form actor@permission", s))
        })?;
        Ok(Self::new(actor.parse()?, permission.parse()?))
    }
}

/// Microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(i64);

impl TimePoint {
    /// The epoch. Used as the grant time of requested and migrated entries.
    pub const ZERO: TimePoint = TimePoint(0);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(&self) -> i64 {
        self.0
    }

    pub fn from_secs(secs: u32) -> Self {
        Self(i64::from(secs) * 1_000_000)
    }

    /// Truncate to whole seconds.
    pub fn to_sec(&self) -> TimePointSec {
        TimePointSec(self.0.div_euclid(1_000_000).clamp(0, i64::from(u32::MAX)) as u32)
    }

    pub fn saturating_add(&self, duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(micros))
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(micros)
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match u64::try_from(self.0) {
            Ok(micros) => {
                let at = UNIX_EPOCH + Duration::from_micros(micros);
                write!(f, "{}", humantime::format_rfc3339_micros(at))
            }
            Err(_) => write!(f, "{}us", self.0),
        }
    }
}

/// Whole seconds since the Unix epoch (transaction expiration resolution).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePointSec(u32);

impl TimePointSec {
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_secs(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = UNIX_EPOCH + Duration::from_secs(u64::from(self.0));
        write!(f, "{}", humantime::format_rfc3339_seconds(at))
    }
}

/// Identity of a proposal: unique per proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalKey {
    pub proposer: Name,
    pub proposal_name: Name,
}

impl ProposalKey {
    pub fn new(proposer: Name, proposal_name: Name) -> Self {
        Self {
            proposer,
            proposal_name,
        }
    }

    /// Deferred-execution key: proposer in the high 64 bits, proposal name in the low.
    pub fn scheduling_key(&self) -> SchedulingKey {
        SchedulingKey(
            (u128::from(self.proposer.as_u64()) << 64) | u128::from(self.proposal_name.as_u64()),
        )
    }
}

impl fmt::Display for ProposalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.proposer, self.proposal_name)
    }
}

/// Key under which an executed proposal's transaction is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulingKey(pub u128);

impl fmt::Display for SchedulingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}
