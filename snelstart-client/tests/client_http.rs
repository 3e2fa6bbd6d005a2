// snelstart-client/tests/client_http.rs
// Client behaviour against a local stub of the sales-order API

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::NaiveDate;
use snelstart_client::{
    ClientError, IdRef, ProcesStatus, RetryPolicy, SnelStartClient, SnelStartConfig,
    VerkooporderCreate, VerkooporderRegel, types::BtwIngaveModel,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted reply: status + optional Retry-After seconds
type Reply = (u16, Option<u64>);

#[derive(Default)]
struct Stub {
    hits: AtomicUsize,
    script: Mutex<VecDeque<Reply>>,
    last_headers: Mutex<Option<HeaderMap>>,
    last_filter: Mutex<Option<String>>,
}

impl Stub {
    fn next_reply(&self) -> Reply {
        self.script.lock().unwrap().pop_front().unwrap_or((201, None))
    }
}

fn error_response(status: u16, retry_after: Option<u64>) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    let mut response = (status, "upstream says no").into_response();
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert("retry-after", secs.to_string().parse().unwrap());
    }
    response
}

async fn create(State(stub): State<Arc<Stub>>, headers: HeaderMap) -> Response {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_headers.lock().unwrap() = Some(headers);
    match stub.next_reply() {
        (s, _) if s < 300 => (
            StatusCode::CREATED,
            Json(serde_json::json!({"id": "r-1", "procesStatus": "Order"})),
        )
            .into_response(),
        (s, retry_after) => error_response(s, retry_after),
    }
}

async fn list(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_filter.lock().unwrap() = params.get("$filter").cloned();
    Json(serde_json::json!([
        {"id": "r-1", "procesStatus": "Factuur"},
        {"id": "r-2", "procesStatus": "Order"}
    ]))
    .into_response()
}

async fn spawn_stub(script: Vec<Reply>) -> (Arc<Stub>, String) {
    let stub = Arc::new(Stub {
        script: Mutex::new(script.into()),
        ..Default::default()
    });
    let app = Router::new()
        .route("/v2/verkooporders", post(create).get(list))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (stub, format!("http://{}/v2", addr))
}

fn client(base_url: &str) -> SnelStartClient {
    let config = SnelStartConfig::new(base_url)
        .with_subscription_key("sub-key")
        .with_access_token("token-123")
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy {
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            max_retries: 3,
            jitter: 0.0,
        });
    SnelStartClient::new(config).unwrap()
}

fn order_body() -> VerkooporderCreate {
    VerkooporderCreate {
        relatie: IdRef::new("c-1"),
        datum: NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        proces_status: ProcesStatus::Order,
        regels: vec![VerkooporderRegel {
            artikel: IdRef::new("p1"),
            omschrijving: Some("Widget".into()),
            stuksprijs: 10.0,
            aantal: 2.0,
        }],
        memo: None,
        verkooporder_btw_ingave_model: BtwIngaveModel::Inclusief,
    }
}

#[tokio::test]
async fn test_create_sends_auth_headers() {
    let (stub, url) = spawn_stub(vec![]).await;
    let created = client(&url).create_verkooporder(&order_body()).await.unwrap();

    assert_eq!(created.id, "r-1");
    assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
    let headers = stub.last_headers.lock().unwrap().clone().unwrap();
    assert_eq!(headers.get("ocp-apim-subscription-key").unwrap(), "sub-key");
    assert_eq!(headers.get("authorization").unwrap(), "Bearer token-123");
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let (stub, url) = spawn_stub(vec![(503, None), (500, None)]).await;
    let created = client(&url).create_verkooporder(&order_body()).await.unwrap();

    assert_eq!(created.id, "r-1");
    assert_eq!(stub.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_rate_limit_honours_retry_after() {
    let (stub, url) = spawn_stub(vec![(429, Some(0))]).await;
    let created = client(&url).create_verkooporder(&order_body()).await.unwrap();

    assert_eq!(created.id, "r-1");
    assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_permanent_error_is_not_retried() {
    let (stub, url) = spawn_stub(vec![(400, None)]).await;
    let err = client(&url).create_verkooporder(&order_body()).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_retryable());
    assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let (stub, url) = spawn_stub(vec![(502, None); 10]).await;
    let err = client(&url).create_verkooporder(&order_body()).await.unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 502, .. }));
    // initial attempt + 3 retries
    assert_eq!(stub.hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_orders_for_relatie_uses_filter() {
    let (stub, url) = spawn_stub(vec![]).await;
    let orders = client(&url).verkooporders_for_relatie("c-42").await.unwrap();

    assert_eq!(orders.len(), 2);
    assert!(orders[0].proces_status.is_invoiced());
    assert_eq!(
        stub.last_filter.lock().unwrap().as_deref(),
        Some("Relatie/Id eq guid'c-42'")
    );
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SnelStartConfig::new(format!("http://{}/v2", addr)).with_retry(RetryPolicy::none());
    let err = SnelStartClient::new(config)
        .unwrap()
        .create_verkooporder(&order_body())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http(_)));
    assert!(err.is_retryable());
}
