//! Order API
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /api/orders | POST | create (201, or 200 on idempotent replay) |
//! | /api/orders | GET | list (status / customer filter, newest first) |
//! | /api/orders/{id} | GET | fetch one |
//! | /api/orders/{id} | PUT | replace items / memo |
//! | /api/orders/{id} | DELETE | delete |
//! | /api/orders/{id}/retry | POST | manual sync retry |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/retry", post(handler::retry))
}
