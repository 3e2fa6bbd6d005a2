//! Sync Queue API (read-only)
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/sync/jobs | GET | queued jobs, soonest first |
//! | /api/sync/dead-letters | GET | dead-lettered jobs, newest first |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sync", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/jobs", get(handler::jobs))
        .route("/dead-letters", get(handler::dead_letters))
}
