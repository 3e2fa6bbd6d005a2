//! Price Override Rule API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/price-rules | GET | list, optional `rule_type` filter |
//! | /api/price-rules | POST | create |
//! | /api/price-rules/{id} | GET / PUT / DELETE | fetch, update, delete |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/price-rules", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
}
