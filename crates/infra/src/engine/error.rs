use thiserror::Error;

use warehouse_core::DomainError;

use crate::store::StoreError;

/// Result type returned by engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure of an inventory engine operation.
///
/// Every store failure is converted into one of these kinds at the engine
/// boundary; store errors never reach the caller as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A caller-supplied argument violated a precondition. Raised before any
    /// store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness constraint (e.g. sku) was violated, or the operation is
    /// refused by policy in the current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The transfer source lacks the requested quantity.
    #[error("insufficient stock (requested: {requested}, available: {available})")]
    InsufficientStock { requested: u64, available: u64 },

    /// The store failed for reasons opaque to the engine.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::NotFound => EngineError::NotFound("entity".to_string()),
            DomainError::Conflict(msg) => EngineError::Conflict(msg),
            DomainError::InsufficientStock {
                requested,
                available,
            } => EngineError::InsufficientStock {
                requested,
                available,
            },
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(msg) => EngineError::NotFound(msg),
            StoreError::Conflict(msg) => EngineError::Conflict(msg),
            StoreError::Unavailable(msg) => EngineError::Persistence(msg),
        }
    }
}
