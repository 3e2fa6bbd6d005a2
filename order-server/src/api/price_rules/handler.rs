//! Price Rule API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use serde::Deserialize;
use shared::error::{ApiResponse, AppResult};
use shared::models::price_rule::{PriceOverrideRule, PriceRuleCreate, PriceRuleUpdate, RuleType};

use crate::api::Operator;
use crate::core::ServerState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub rule_type: Option<RuleType>,
}

/// GET /api/price-rules
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<Vec<PriceOverrideRule>>> {
    Ok(ApiResponse::success(state.pricing.list(params.rule_type)?))
}

/// GET /api/price-rules/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PriceOverrideRule>> {
    Ok(ApiResponse::success(state.pricing.get(&id)?))
}

/// POST /api/price-rules
pub async fn create(
    State(state): State<ServerState>,
    Operator(operator): Operator,
    Json(payload): Json<PriceRuleCreate>,
) -> AppResult<(StatusCode, ApiResponse<PriceOverrideRule>)> {
    let rule = state.pricing.create(payload, operator)?;
    Ok((StatusCode::CREATED, ApiResponse::success(rule)))
}

/// PUT /api/price-rules/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Operator(operator): Operator,
    Json(payload): Json<PriceRuleUpdate>,
) -> AppResult<ApiResponse<PriceOverrideRule>> {
    Ok(ApiResponse::success(state.pricing.update(&id, payload, operator)?))
}

/// DELETE /api/price-rules/:id
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Operator(operator): Operator,
) -> AppResult<ApiResponse<PriceOverrideRule>> {
    let removed = state.pricing.delete(&id, operator)?;
    Ok(ApiResponse::success_with_message("Price rule deleted", removed))
}
