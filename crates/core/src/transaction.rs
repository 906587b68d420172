use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Add,
    Update,
    Delete,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requested change to one record.
///
/// `extra` carries flavor-specific data: `()` for flat record sets,
/// [`TreePath`] for tree-shaped ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction<Id, X = ()> {
    pub id: Id,
    pub kind: TransactionKind,
    pub new_value: Value,
    pub extra: X,
}

impl<Id, X: Default> Transaction<Id, X> {
    pub fn new(id: impl Into<Id>, kind: TransactionKind, new_value: impl Into<Value>) -> Self {
        Self {
            id: id.into(),
            kind,
            new_value: new_value.into(),
            extra: X::default(),
        }
    }

    pub fn add(id: impl Into<Id>, new_value: impl Into<Value>) -> Self {
        Self::new(id, TransactionKind::Add, new_value)
    }

    pub fn update(id: impl Into<Id>, new_value: impl Into<Value>) -> Self {
        Self::new(id, TransactionKind::Update, new_value)
    }

    /// Delete with the conventional null payload.
    pub fn delete(id: impl Into<Id>) -> Self {
        Self::new(id, TransactionKind::Delete, Value::Null)
    }
}

impl<Id: Serialize, X: Serialize> Transaction<Id, X> {
    pub fn to_msgpack(&self) -> Result<Vec<u8>, CoreError> {
        rmp_serde::to_vec(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

impl<Id, X> Transaction<Id, X>
where
    Id: for<'de> Deserialize<'de>,
    X: for<'de> Deserialize<'de>,
{
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, CoreError> {
        rmp_serde::from_slice(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

/// Encode a change set (for example the aggregated changes of a service) as
/// MessagePack for handing to a backend.
pub fn encode_changes<Id: Serialize, X: Serialize>(
    changes: &[Transaction<Id, X>],
) -> Result<Vec<u8>, CoreError> {
    rmp_serde::to_vec(changes).map_err(|e| CoreError::Serialization(e.to_string()))
}

pub fn decode_changes<Id, X>(bytes: &[u8]) -> Result<Vec<Transaction<Id, X>>, CoreError>
where
    Id: for<'de> Deserialize<'de>,
    X: for<'de> Deserialize<'de>,
{
    rmp_serde::from_slice(bytes).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Ancestor chain of a record in a tree-shaped data source, root first.
/// `None` means the record sits at the root (or the source is flat).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePath<Id> {
    pub path: Option<Vec<Id>>,
}

impl<Id> Default for TreePath<Id> {
    fn default() -> Self {
        Self { path: None }
    }
}

impl<Id> TreePath<Id> {
    pub fn new(path: Vec<Id>) -> Self {
        Self { path: Some(path) }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &Id) -> bool
    where
        Id: PartialEq,
    {
        self.path.as_ref().is_some_and(|p| p.contains(id))
    }
}

impl<Id> Transaction<Id, TreePath<Id>> {
    pub fn with_path(mut self, path: impl IntoIterator<Item = impl Into<Id>>) -> Self {
        self.extra = TreePath::new(path.into_iter().map(Into::into).collect());
        self
    }
}

/// Aggregate of all uncommitted changes to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State<X = ()> {
    /// Accumulated diff for updates, full value for adds.
    pub value: Value,
    /// The record as it exists in the data source. Absent for adds.
    pub record_ref: Option<Value>,
    pub kind: TransactionKind,
    pub extra: X,
}

/// A transaction together with the record reference it was added with.
/// Undo and redo move whole batches of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action<Id, X = ()> {
    pub transaction: Transaction<Id, X>,
    pub record_ref: Option<Value>,
}

pub type Batch<Id, X = ()> = Vec<Action<Id, X>>;
