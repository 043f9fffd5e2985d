//! Warranty domain errors

use core_kernel::{CoreError, PortError};
use thiserror::Error;

/// Errors that can occur in the warranty domain
#[derive(Debug, Error)]
pub enum WarrantyError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl WarrantyError {
    pub fn validation(message: impl Into<String>) -> Self {
        WarrantyError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        WarrantyError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true for any flavour of missing entity, including port-level ones
    pub fn is_not_found(&self) -> bool {
        match self {
            WarrantyError::NotFound { .. } => true,
            WarrantyError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<CoreError> for WarrantyError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::Validation(msg) => WarrantyError::Validation(msg),
        }
    }
}
