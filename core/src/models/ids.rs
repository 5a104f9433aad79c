//! Strongly typed identifiers
//!
//! Callers are identified by an opaque `Principal`, batches by a positive
//! sequential `BatchId`.

use std::fmt::{Display, Formatter, Result as FmtResult};
use serde::{Serialize, Deserialize};

/// Opaque, already-authenticated caller identity
///
/// No structure is assumed beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Create a principal from any string-like identity
    pub fn new(id: impl Into<String>) -> Self {
        Principal(id.into())
    }

    /// Borrow the underlying identity string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identity string is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Principal::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Principal(id)
    }
}

/// Identifier of a registered crop batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(u64);

impl BatchId {
    /// First id handed out by an empty registry
    pub const FIRST: BatchId = BatchId(1);

    /// Largest counter value a restored registry may start from
    ///
    /// Ids stay within the signed 64-bit range, and a registry restored at the
    /// limit still has 2^63 registrations before the counter could overflow.
    pub const LIMIT: BatchId = BatchId(i64::MAX as u64);

    /// Wrap a raw id
    pub const fn new(id: u64) -> Self {
        BatchId(id)
    }

    /// Raw numeric value
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The id allocated after this one
    ///
    /// Callers only advance counters that started at or below `LIMIT`.
    pub(crate) fn successor(&self) -> BatchId {
        BatchId(self.0 + 1)
    }
}

impl Display for BatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BatchId {
    fn from(id: u64) -> Self {
        BatchId(id)
    }
}
