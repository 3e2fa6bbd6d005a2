//! Unified error codes for the wholesale platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Pricing errors
//! - 9xxx: System errors (storage, ERP gateway)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no items
    OrderEmpty = 4002,
    /// Order is already synced to the ERP
    OrderAlreadySynced = 4003,
    /// Order has been invoiced in the ERP and can no longer change
    OrderInvoiced = 4004,
    /// Item quantity must be positive
    InvalidQuantity = 4005,
    /// Item price must be a finite, non-negative number
    InvalidPrice = 4006,

    // ==================== 6xxx: Pricing ====================
    /// Price override rule not found
    PriceRuleNotFound = 6101,
    /// Price override rule shape does not match its type
    PriceRuleInvalid = 6102,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// ERP gateway unavailable (429, 5xx, network)
    GatewayUnavailable = 9101,
    /// ERP gateway rejected the request (4xx)
    GatewayRejected = 9102,
    /// ERP gateway call timed out
    GatewayTimeout = 9103,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderAlreadySynced => "Order is already synced",
            ErrorCode::OrderInvoiced => "Cannot modify invoiced order",
            ErrorCode::InvalidQuantity => "Quantity must be positive",
            ErrorCode::InvalidPrice => "Price must be a non-negative number",

            // Pricing
            ErrorCode::PriceRuleNotFound => "Price rule not found",
            ErrorCode::PriceRuleInvalid => "Price rule is invalid for its type",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::GatewayUnavailable => "ERP gateway unavailable",
            ErrorCode::GatewayRejected => "ERP gateway rejected the request",
            ErrorCode::GatewayTimeout => "ERP gateway timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderAlreadySynced),
            4004 => Ok(ErrorCode::OrderInvoiced),
            4005 => Ok(ErrorCode::InvalidQuantity),
            4006 => Ok(ErrorCode::InvalidPrice),

            // Pricing
            6101 => Ok(ErrorCode::PriceRuleNotFound),
            6102 => Ok(ErrorCode::PriceRuleInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),
            9101 => Ok(ErrorCode::GatewayUnavailable),
            9102 => Ok(ErrorCode::GatewayRejected),
            9103 => Ok(ErrorCode::GatewayTimeout),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderInvoiced.code(), 4004);
        assert_eq!(ErrorCode::PriceRuleNotFound.code(), 6101);
        assert_eq!(ErrorCode::GatewayUnavailable.code(), 9101);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(4003), Ok(ErrorCode::OrderAlreadySynced));
        assert_eq!(ErrorCode::try_from(9002), Ok(ErrorCode::DatabaseError));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::OrderInvoiced).unwrap();
        assert_eq!(json, "4004");
        let code: ErrorCode = serde_json::from_str("6102").unwrap();
        assert_eq!(code, ErrorCode::PriceRuleInvalid);
    }

    #[test]
    fn test_deserialize_invalid() {
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::OrderInvoiced.message(), "Cannot modify invoiced order");
        assert_eq!(ErrorCode::OrderAlreadySynced.message(), "Order is already synced");
    }
}
