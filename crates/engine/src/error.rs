//! Engine error types.

use domain::OrderStatus;
use order_store::StoreError;
use thiserror::Error;

/// Errors that can occur during lifecycle operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request failed validation before any writes happened.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist. Aborts the enclosing
    /// transaction.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The requested status change is not legal from the current state.
    /// Aborts without partial writes.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        EngineError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
