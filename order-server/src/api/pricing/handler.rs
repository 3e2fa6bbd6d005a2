//! Pricing API Handlers

use axum::{Json, extract::State};
use shared::error::{ApiResponse, AppResult};
use shared::models::price_rule::{BatchPriceRequest, PriceRequest, PriceResolution};

use crate::core::ServerState;

/// POST /api/pricing/calculate
pub async fn calculate(
    State(state): State<ServerState>,
    Json(payload): Json<PriceRequest>,
) -> AppResult<ApiResponse<PriceResolution>> {
    Ok(ApiResponse::success(state.pricing.calculate(&payload)?))
}

/// POST /api/pricing/calculate-batch - one resolution per line, in order
pub async fn calculate_batch(
    State(state): State<ServerState>,
    Json(payload): Json<BatchPriceRequest>,
) -> AppResult<ApiResponse<Vec<PriceResolution>>> {
    Ok(ApiResponse::success(state.pricing.calculate_batch(&payload)?))
}
