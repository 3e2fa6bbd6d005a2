//! SnelStart Client - HTTP client for the SnelStart B2B API
//!
//! Covers the sales-order (`verkooporders`) resource used by the order
//! server:
//!
//! - create a sales order
//! - list sales orders for a customer (relatie)
//!
//! Every request carries the APIM subscription key and bearer token, and is
//! retried internally on 429 / 5xx / network errors with exponential backoff
//! plus jitter, honouring `Retry-After` when the API sends one.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use client::SnelStartClient;
pub use config::SnelStartConfig;
pub use error::{ClientError, ClientResult};
pub use retry::RetryPolicy;
pub use types::{IdRef, ProcesStatus, Verkooporder, VerkooporderCreate, VerkooporderRegel};
