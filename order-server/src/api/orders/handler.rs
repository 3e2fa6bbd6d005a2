//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use shared::error::{ApiResponse, AppResult};
use shared::order::{CreateOrderRequest, LocalOrder, OrderQuery, OrderStatus, UpdateOrderRequest};
use validator::Validate;

use crate::api::{Operator, validate};
use crate::core::ServerState;
use crate::orders::CreateOutcome;

/// List query parameters
#[derive(Debug, Deserialize, Validate)]
pub struct ListParams {
    pub status: Option<OrderStatus>,
    #[validate(length(min = 1))]
    pub customer_id: Option<String>,
    pub offset: Option<usize>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub items: Vec<LocalOrder>,
    pub total: usize,
}

/// POST /api/orders - create an order
pub async fn create(
    State(state): State<ServerState>,
    Operator(operator): Operator,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<(StatusCode, ApiResponse<LocalOrder>)> {
    let outcome = state.orders.create_order(payload, operator).await?;
    Ok(match outcome {
        CreateOutcome::Created(order) => (StatusCode::CREATED, ApiResponse::success(order)),
        CreateOutcome::Replayed(order) => (
            StatusCode::OK,
            ApiResponse::success_with_message("Existing order for idempotency key", order),
        ),
    })
}

/// GET /api/orders - list orders
pub async fn list(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<OrderListResponse>> {
    validate(&params)?;
    let query = OrderQuery {
        status: params.status,
        customer_id: params.customer_id,
        offset: params.offset,
        limit: params.limit,
    };
    let (items, total) = state.orders.list_orders(&query)?;
    Ok(ApiResponse::success(OrderListResponse { items, total }))
}

/// GET /api/orders/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LocalOrder>> {
    Ok(ApiResponse::success(state.orders.get_order(&id)?))
}

/// PUT /api/orders/:id - refused once the ERP has invoiced the order
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Operator(operator): Operator,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<ApiResponse<LocalOrder>> {
    let order = state.orders.update_order(&id, payload, operator).await?;
    Ok(ApiResponse::success(order))
}

/// DELETE /api/orders/:id - refused once the ERP has invoiced the order
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Operator(operator): Operator,
) -> AppResult<ApiResponse<LocalOrder>> {
    let removed = state.orders.delete_order(&id, operator).await?;
    Ok(ApiResponse::success_with_message("Order deleted", removed))
}

/// POST /api/orders/:id/retry - reset attempts and queue a sync
pub async fn retry(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Operator(operator): Operator,
) -> AppResult<ApiResponse<LocalOrder>> {
    let order = state.orders.retry_order(&id, operator)?;
    Ok(ApiResponse::success_with_message("Sync retry queued", order))
}
