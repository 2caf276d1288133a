//! Billing domain errors

use thiserror::Error;

use core_kernel::{CoreError, MoneyError, PortError};

/// Errors that can occur in the billing domain
///
/// Validation failures are always raised before any ledger mutation, so a
/// `Validation` error guarantees nothing was written.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invalid input (non-positive amount, zero quantity, blank description,
    /// currency mismatch)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced folio, payment, reservation or guest does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: String,
        id: String,
    },

    /// The payment gateway failed, timed out or answered with an error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// The operation conflicts with the current state (e.g. re-confirming a
    /// completed payment)
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// The ledger store failed
    #[error("Storage error: {0}")]
    Storage(#[source] PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn not_found(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        BillingError::InconsistentState(message.into())
    }
}

impl From<PortError> for BillingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Validation { message, .. } => BillingError::Validation(message),
            other => BillingError::Storage(other),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(err: MoneyError) -> Self {
        BillingError::Validation(err.to_string())
    }
}

impl From<CoreError> for BillingError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Money(e) => e.into(),
            CoreError::Validation(m) => BillingError::Validation(m),
            CoreError::InvalidStateTransition(m) => BillingError::InconsistentState(m),
            CoreError::NotFound(m) => BillingError::NotFound {
                entity: "Record".to_string(),
                id: m,
            },
        }
    }
}
