//! Local order model
//!
//! A [`LocalOrder`] is the durable, locally owned record of a wholesale
//! order. It is created before any ERP call is made and carries the sync
//! lifecycle ([`OrderStatus`]) plus retry metadata.
//!
//! ```text
//! DRAFT ──► PENDING_SYNC ──► SYNCED   (terminal)
//!                │  ▲
//!                ▼  │ retry_order
//!              FAILED
//! ```

pub mod types;

pub use types::*;
