//! Order orchestration errors

use crate::db::StorageError;
use crate::gateway::GatewayError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed input, rejected before any write
    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Order {0} is already synced")]
    AlreadySynced(String),

    #[error("Cannot modify invoiced order {0}")]
    Invoiced(String),

    /// Sync attempt failed; `terminal` when the order is now FAILED
    #[error("Sync failed: {source}")]
    SyncFailed {
        #[source]
        source: GatewayError,
        terminal: bool,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl OrderError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: message.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation { code, message } => AppError::with_message(code, message),
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
                    .with_detail("order_id", id)
            }
            OrderError::AlreadySynced(id) => AppError::new(ErrorCode::OrderAlreadySynced)
                .with_detail("order_id", id),
            OrderError::Invoiced(id) => {
                AppError::new(ErrorCode::OrderInvoiced).with_detail("order_id", id)
            }
            OrderError::SyncFailed { source, .. } => {
                AppError::with_message(source.error_code(), source.to_string())
            }
            OrderError::Storage(e) => e.into(),
        }
    }
}
