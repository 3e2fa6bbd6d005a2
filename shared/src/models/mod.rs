//! Data models
//!
//! Shared between order-server and its API clients.
//! All ids are UUID strings; timestamps are Unix millis.

pub mod price_rule;

// Re-exports
pub use price_rule::*;
