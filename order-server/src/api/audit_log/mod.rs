//! Audit Log API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/audit | GET | filtered, paginated, newest first |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit", routes())
}

fn routes() -> Router<ServerState> {
    Router::new().route("/", get(handler::list))
}
