//! Sync Queue API Handlers

use axum::extract::State;
use shared::error::{ApiResponse, AppResult};

use crate::core::ServerState;
use crate::orders::{DeadLetterEntry, SyncJob};

/// GET /api/sync/jobs
pub async fn jobs(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<SyncJob>>> {
    let mut jobs = state.queue.jobs()?;
    jobs.sort_by_key(|j| j.next_run_at);
    Ok(ApiResponse::success(jobs))
}

/// GET /api/sync/dead-letters
pub async fn dead_letters(
    State(state): State<ServerState>,
) -> AppResult<ApiResponse<Vec<DeadLetterEntry>>> {
    Ok(ApiResponse::success(state.queue.dead_letters()?))
}
