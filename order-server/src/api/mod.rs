//! HTTP API
//!
//! # Structure
//!
//! - [`health`] - liveness and queue depth
//! - [`orders`] - order create / list / get / update / delete / retry
//! - [`price_rules`] - price override rule CRUD
//! - [`pricing`] - price resolution
//! - [`sync`] - sync queue inspection
//! - [`audit_log`] - audit log query
//!
//! Every response uses the `ApiResponse` envelope; errors are `AppError`.

pub mod audit_log;
pub mod health;
pub mod orders;
pub mod price_rules;
pub mod pricing;
pub mod sync;

use axum::Router;
use axum::extract::FromRequestParts;
use http::request::Parts;
use http::{HeaderName, HeaderValue};
use shared::error::{AppError, AppResult};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use validator::Validate;

use crate::core::ServerState;

/// Header carrying the acting user id (recorded in audit entries)
pub const OPERATOR_HEADER: &str = "x-user-id";
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Acting user from the `X-User-Id` header, if any
#[derive(Debug, Clone, Default)]
pub struct Operator(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for Operator {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from);
        Ok(Self(id))
    }
}

/// Run `validator` rules, mapping failures to a 400
pub(crate) fn validate<T: Validate>(value: &T) -> AppResult<()> {
    value
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))
}

#[derive(Clone)]
struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// All routes, no middleware
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(price_rules::router())
        .merge(pricing::router())
        .merge(sync::router())
        .merge(audit_log::router())
}

/// Routes plus tower-http middleware
pub fn build_app() -> Router<ServerState> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // Set runs first so the generated id is echoed on the response
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), UuidRequestId))
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}
