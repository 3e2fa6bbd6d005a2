//! Health check
//!
//! | Path | Method | Meaning |
//! |------|--------|---------|
//! | /health | GET | liveness, database check and sync queue depth |

use axum::{Router, extract::State, routing::get};
use redb::ReadableDatabase;
use serde::Serialize;
use shared::error::{ApiResponse, AppResult};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    database: &'static str,
    queued_jobs: usize,
    dead_letters: usize,
}

async fn health(State(state): State<ServerState>) -> AppResult<ApiResponse<HealthResponse>> {
    let database = match state.db.begin_read() {
        Ok(_) => "ok",
        Err(e) => {
            tracing::error!(error = %e, "Health check: database unavailable");
            "error"
        }
    };
    let queued_jobs = state.queue.jobs().map(|j| j.len()).unwrap_or(0);
    let dead_letters = state.queue.dead_letters().map(|d| d.len()).unwrap_or(0);

    Ok(ApiResponse::success(HealthResponse {
        status: if database == "ok" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        queued_jobs,
        dead_letters,
    }))
}
