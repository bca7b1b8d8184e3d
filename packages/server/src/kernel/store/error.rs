use std::fmt;

use thiserror::Error;

/// The four statement kinds the company store supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Insert,
    Select,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Insert => write!(f, "insert"),
            OperationKind::Select => write!(f, "select"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

/// Errors raised while preparing or executing a store operation.
///
/// The first group is caller error raised during prepare, before the store is
/// touched. `NotFound` means the statement ran and matched no row. Driver
/// errors are passed through untouched in `Database`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{operation}: invalid input: {reason}")]
    InvalidInput {
        operation: OperationKind,
        reason: String,
    },

    #[error("{operation}: missing key `id`")]
    MissingKey { operation: OperationKind },

    #[error("{operation}: unsupported shape: expected a company object, got {found}")]
    UnsupportedShape {
        operation: OperationKind,
        found: &'static str,
    },

    #[error("{operation}: invalid argument: {reason}")]
    InvalidArg {
        operation: OperationKind,
        reason: String,
    },

    #[error("{operation}: no company with id {id}")]
    NotFound { operation: OperationKind, id: String },

    #[error("store not connected")]
    NotConnected,

    #[error("execute called without a prepared statement")]
    NotPrepared,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Errors caused by the caller's input rather than the store.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidInput { .. }
                | StoreError::MissingKey { .. }
                | StoreError::UnsupportedShape { .. }
                | StoreError::InvalidArg { .. }
        )
    }
}
