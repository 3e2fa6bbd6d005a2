//! Audit Log API Handlers

use axum::extract::{Query, State};
use shared::error::{ApiResponse, AppResult};

use crate::api::validate;
use crate::audit::{AuditListResponse, AuditQuery};
use crate::core::ServerState;

/// GET /api/audit
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<ApiResponse<AuditListResponse>> {
    validate(&query)?;
    let (items, total) = state.audit.query(&query)?;
    Ok(ApiResponse::success(AuditListResponse { items, total }))
}
