//! Order operation errors
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `NotFound` | No match for the id, or a listing with zero results |
//! | `InvalidArgument` | Malformed id, no items, amount overflow |
//! | `Storage` | Engine I/O failure, serialization failure, corruption |
//!
//! Nothing here is retried. Errors surface once, immediately.

use thiserror::Error;

use super::engine::StorageError;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}

impl OrderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, OrderError::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, OrderError::InvalidArgument(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, OrderError::Storage { .. })
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

/// Attach a short description of the failed step to a storage error
pub(crate) trait StorageContext<T> {
    fn context(self, context: &'static str) -> OrderResult<T>;
}

impl<T> StorageContext<T> for Result<T, StorageError> {
    fn context(self, context: &'static str) -> OrderResult<T> {
        self.map_err(|source| OrderError::Storage { context, source })
    }
}
