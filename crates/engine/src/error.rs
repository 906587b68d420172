use editlog_core::{CoreError, TransactionKind};
use thiserror::Error;

/// Rejections raised by [`TransactionService::add`](crate::TransactionService::add).
///
/// Validation runs before any mutation, so a rejected transaction leaves the
/// service untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error("cannot add this transaction: transaction with id {id} has already been added")]
    DuplicateAdd { id: String },

    #[error("cannot add this transaction: transaction with id {id} has already been deleted")]
    AlreadyDeleted { id: String },

    #[error(
        "cannot add this transaction: this is the first {kind} transaction for id {id}, \
         a record reference is mandatory"
    )]
    MissingRecordRef { id: String, kind: TransactionKind },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
