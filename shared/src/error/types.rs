//! `AppError` and the JSON envelope every handler answers with

use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Error returned across the API boundary
///
/// Order, pricing and storage errors convert into this; `details` carries
/// the identifiers a client needs (order id, field name, ERP status).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    /// Request body or query failed field validation
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// redb or serialization failure
    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }
}

/// Response envelope
///
/// `code` is 0 on success. Failures carry the [`ErrorCode`] value plus the
/// error's `details`; `data` is only set on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::success_with_message("OK", data)
    }

    /// Success with a message other than "OK" (e.g. an idempotent replay)
    pub fn success_with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: Some(0),
            message: message.into(),
            data: Some(data),
            details: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(err: &AppError) -> Self {
        err.clone().into()
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

// ===== Axum Integration =====

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.http_status();
        if matches!(self.code.category(), super::category::ErrorCategory::System) {
            tracing::error!(code = %self.code, message = %self.message, "Request failed with system error");
        }
        (status, axum::Json(ApiResponse::<()>::error(&self))).into_response()
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            None | Some(0) => StatusCode::OK,
            Some(code) => ErrorCode::try_from(code)
                .map(|c| c.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        };
        (status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_message_comes_from_code() {
        let err = AppError::new(ErrorCode::OrderNotFound);
        assert_eq!(err.message, ErrorCode::OrderNotFound.message());
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), err.message);
    }

    #[test]
    fn test_item_validation_details() {
        let err = AppError::validation("quantity must be positive")
            .with_detail("field", "quantity")
            .with_detail("index", 2);

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        assert_eq!(details["field"], "quantity");
        assert_eq!(details["index"], 2);
    }

    #[test]
    fn test_invoiced_order_maps_to_conflict() {
        assert_eq!(
            AppError::new(ErrorCode::OrderInvoiced).http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::database("table missing").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_envelope_keeps_order_id() {
        let err = AppError::with_message(ErrorCode::OrderAlreadySynced, "Order o-1 already synced")
            .with_detail("order_id", "o-1");
        let response = ApiResponse::<()>::error(&err);

        assert_eq!(response.code, Some(ErrorCode::OrderAlreadySynced.code()));
        assert_eq!(response.message, "Order o-1 already synced");
        assert!(response.data.is_none());
        assert_eq!(response.details.unwrap()["order_id"], "o-1");
    }

    #[test]
    fn test_success_envelope_json() {
        let json = serde_json::to_value(ApiResponse::success_with_message("Existing order", 20.0)).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["message"], "Existing order");
        assert_eq!(json["data"], 20.0);
        assert!(json.get("details").is_none());
    }
}
