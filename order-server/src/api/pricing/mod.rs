//! Price Resolution API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/pricing/calculate | POST | resolve one product price |
//! | /api/pricing/calculate-batch | POST | resolve many lines for one customer |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/pricing", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/calculate", post(handler::calculate))
        .route("/calculate-batch", post(handler::calculate_batch))
}
