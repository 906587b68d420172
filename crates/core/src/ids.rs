use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

use crate::value::Value;

/// Identifier of a record tracked by the transaction engine.
///
/// The engine only needs equality and hashing; `to_value` lets reconciliation
/// compare an id against the primary-key field of a stored record.
pub trait RecordKey: Clone + Eq + Hash + fmt::Debug + fmt::Display {
    fn to_value(&self) -> Value;
}

/// General-purpose record key: grid rows are keyed by numbers, strings, or
/// generated UUIDs for rows added on the client.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordId {
    Int(i64),
    Text(String),
    Uuid(Uuid),
}

impl RecordId {
    /// Mint a fresh time-ordered key for a newly added record.
    pub fn generate() -> Self {
        Self::Uuid(Uuid::now_v7())
    }
}

impl RecordKey for RecordId {
    fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::Integer(*n),
            Self::Text(s) => Value::Text(s.clone()),
            Self::Uuid(u) => Value::Text(u.to_string()),
        }
    }
}

impl RecordKey for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl RecordKey for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for RecordId {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Uuid> for RecordId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "RecordId({n})"),
            Self::Text(s) => write!(f, "RecordId({s:?})"),
            Self::Uuid(u) => write!(f, "RecordId({})", &u.to_string()[..8]),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Uuid(u) => write!(f, "{u}"),
        }
    }
}
