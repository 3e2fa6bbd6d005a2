//! Price override resolution
//!
//! [`resolver::calculate_price`] is pure; [`PriceRuleService`] loads rules
//! from redb, caches results and audits rule changes.

pub mod cache;
pub mod error;
pub mod matcher;
pub mod resolver;
pub mod service;
pub mod storage;
pub mod validation;

pub use error::{PricingError, PricingResult};
pub use resolver::calculate_price;
pub use service::PriceRuleService;
pub use storage::PriceRuleStorage;
