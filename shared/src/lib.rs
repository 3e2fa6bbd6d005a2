//! Shared types for the wholesale order platform
//!
//! Domain types used by both the order server and the ERP client:
//! local orders, price override rules, the unified error system and
//! small time/id utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::price_rule::{PriceOverrideRule, RuleType};
pub use order::{LocalOrder, OrderItem, OrderStatus};
