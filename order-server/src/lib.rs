//! Order Server - wholesale order intake and SnelStart ERP sync
//!
//! # Overview
//!
//! - **Orders** (`orders`): idempotent intake, local persistence, sync to the
//!   ERP with a durable retry queue, invoiced guard on edits
//! - **Pricing** (`pricing`): tiered price override rules and resolution
//! - **Audit** (`audit`): append-only action log
//! - **Gateway** (`gateway`): the ERP as seen by the pipeline
//! - **HTTP API** (`api`): REST endpoints
//!
//! # Layout
//!
//! ```text
//! order-server/src/
//! ├── core/      # config, state, server, background tasks
//! ├── api/       # HTTP routes and handlers
//! ├── audit/     # audit log
//! ├── db/        # redb helpers
//! ├── gateway/   # ERP gateway trait + SnelStart implementation
//! ├── orders/    # storage, orchestrator, sync queue, worker
//! ├── pricing/   # price rules, resolver, cache
//! └── utils/     # logging
//! ```

pub mod api;
pub mod audit;
pub mod core;
pub mod db;
pub mod gateway;
pub mod orders;
pub mod pricing;
pub mod utils;

pub use core::{Config, Server, ServerState};
pub use orders::{OrderOrchestrator, OrderStorage};
pub use pricing::PriceRuleService;
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use utils::init_logger_with_file;
