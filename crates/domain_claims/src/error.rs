//! Claims domain errors

use core_kernel::PortError;
use domain_warranty::WarrantyError;
use thiserror::Error;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("{0}")]
    Validation(String),

    #[error("Warranty part {part} does not belong to warranty {warranty}")]
    ForeignWarrantyPart { part: String, warranty: String },

    #[error(transparent)]
    Warranty(#[from] WarrantyError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ClaimError::Port(e) => e.is_not_found(),
            ClaimError::Warranty(e) => e.is_not_found(),
            _ => false,
        }
    }
}
