//! Pricing errors

use crate::db::StorageError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    /// Rule shape does not fit its type
    #[error("Invalid price rule: {0}")]
    InvalidRule(String),

    /// Malformed price calculation request
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Price rule not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type PricingResult<T> = Result<T, PricingError>;

impl From<PricingError> for AppError {
    fn from(err: PricingError) -> Self {
        match err {
            PricingError::InvalidRule(msg) => AppError::with_message(ErrorCode::PriceRuleInvalid, msg),
            PricingError::InvalidRequest(msg) => AppError::invalid_request(msg),
            PricingError::NotFound(id) => {
                AppError::with_message(ErrorCode::PriceRuleNotFound, format!("Price rule {} not found", id))
                    .with_detail("rule_id", id)
            }
            PricingError::Storage(e) => e.into(),
        }
    }
}
