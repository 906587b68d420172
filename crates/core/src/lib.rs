pub mod clone;
pub mod error;
pub mod ids;
pub mod merge;
pub mod transaction;
pub mod value;

pub use clone::{CloneStrategy, DeepClone};
pub use error::CoreError;
pub use ids::{RecordId, RecordKey};
pub use transaction::{
    Action, Batch, State, Transaction, TransactionKind, TreePath, decode_changes, encode_changes,
};
pub use value::{Object, Value};
