//! Drives the HTTP router in-process against the in-memory ledger.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::ServiceExt;

use userbalance_common::{AccountId, Currency, LedgerError, Result};
use userbalance_fx::{CurrencyConverter, MockRateProvider, RateCache, RateCacheConfig};
use userbalance_ledger::{
    BalanceInfo, HistoryOrder, InMemoryLedgerStore, LedgerStore, TransactionRecord,
};
use userbalance_server::{router, BalanceService, HealthState};

/// Store whose datastore is always down.
struct UnavailableStore;

fn unavailable() -> LedgerError {
    LedgerError::Internal("connection refused by db-primary:5432 (role balance_rw)".to_string())
}

#[async_trait]
impl LedgerStore for UnavailableStore {
    async fn get_balance(&self, _account_id: AccountId) -> Result<BalanceInfo> {
        Err(unavailable())
    }

    async fn change_balance(&self, _account_id: AccountId, _delta: Decimal) -> Result<String> {
        Err(unavailable())
    }

    async fn transfer_between(
        &self,
        _from: AccountId,
        _to: AccountId,
        _delta: Decimal,
    ) -> Result<String> {
        Err(unavailable())
    }

    async fn get_history(
        &self,
        _account_id: AccountId,
        _order: HistoryOrder,
    ) -> Result<Vec<TransactionRecord>> {
        Err(unavailable())
    }
}

fn app() -> Router {
    app_with(Arc::new(InMemoryLedgerStore::new()))
}

fn app_with(store: Arc<dyn LedgerStore>) -> Router {
    let provider = Arc::new(MockRateProvider::new(
        Currency::rub(),
        [(Currency::usd(), dec!(0.025))],
    ));
    let cache = Arc::new(RateCache::new(provider, RateCacheConfig::default()));
    let converter = Arc::new(CurrencyConverter::new(cache, Currency::rub()));
    router(
        Arc::new(BalanceService::new(store, converter)),
        HealthState::default(),
    )
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn credit(app: &Router, id: i64, delta: f64) {
    let (status, _) = send(
        app,
        Method::PUT,
        "/account/change-balance",
        Some(json!({ "id": id, "delta": delta })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_alive_responds() {
    let app = app();
    let response = app
        .oneshot(Request::get("/alive").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_without_monitor_is_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_change_balance_then_read() {
    let app = app();
    credit(&app, 1, 1000.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/change-balance",
        Some(json!({ "id": 1, "delta": -200 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("debited"));

    let (status, body) = send(&app, Method::GET, "/account/1/balance", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    assert_eq!(body["balance"].as_f64(), Some(800.0));
    assert_eq!(body["currency"], "RUB");
}

#[tokio::test]
async fn test_balance_in_requested_currency() {
    let app = app();
    credit(&app, 1, 40.0).await;

    let (status, body) = send(&app, Method::GET, "/account/1/balance?currency=usd", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"].as_f64(), Some(1.0));
    assert_eq!(body["currency"], "USD");

    let (_, body) = send(&app, Method::GET, "/account/1/balance?currency=XYZ", None).await;
    assert_eq!(body["balance"].as_f64(), Some(40.0));
    assert_eq!(body["currency"], "RUB");
}

#[tokio::test]
async fn test_unknown_account_has_zero_balance() {
    let (status, body) = send(&app(), Method::GET, "/account/99/balance", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 99);
    assert_eq!(body["balance"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn test_overdraft_is_forbidden() {
    let app = app();
    credit(&app, 2, 50.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/change-balance",
        Some(json!({ "id": 2, "delta": -100 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");

    let (_, body) = send(&app, Method::GET, "/account/2/balance", None).await;
    assert_eq!(body["balance"].as_f64(), Some(50.0));
}

#[tokio::test]
async fn test_malformed_input_is_bad_request() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/account/abc/balance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");

    let (status, _) = send(&app, Method::GET, "/account/0/balance", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/account/change-balance",
        Some(json!({ "id": "one", "delta": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/change-balance",
        Some(json!({ "id": 1, "delta": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "WRONG_INPUT");
}

#[tokio::test]
async fn test_transfer_moves_funds() {
    let app = app();
    credit(&app, 3, 100.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/transfer",
        Some(json!({ "id1": 3, "id2": 4, "delta": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (_, from) = send(&app, Method::GET, "/account/3/balance", None).await;
    let (_, to) = send(&app, Method::GET, "/account/4/balance", None).await;
    assert_eq!(from["balance"].as_f64(), Some(60.0));
    assert_eq!(to["balance"].as_f64(), Some(40.0));
}

#[tokio::test]
async fn test_transfer_rejections() {
    let app = app();
    credit(&app, 3, 100.0).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/transfer",
        Some(json!({ "id1": 3, "id2": 3, "delta": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "WRONG_INPUT");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/account/transfer",
        Some(json!({ "id1": 3, "id2": 4, "delta": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_history_sorted_and_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/account/5/history", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");

    credit(&app, 5, 10.0).await;
    credit(&app, 5, 300.0).await;
    credit(&app, 5, 42.0).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/account/5/history?sort_by=amount&descending=true",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let deltas: Vec<f64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|record| record["delta"].as_f64().unwrap())
        .collect();
    assert_eq!(deltas, vec![300.0, 42.0, 10.0]);
    assert_eq!(body[0]["account_id"], 5);
    assert_eq!(body[0]["resulting_balance"].as_f64(), Some(310.0));
    assert!(body[0]["operation_id"].is_string());
}

#[tokio::test]
async fn test_history_bad_sort_key() {
    let app = app();
    credit(&app, 6, 10.0).await;

    let (status, body) = send(&app, Method::GET, "/account/6/history?sort_by=colour", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "WRONG_INPUT");
}

#[tokio::test]
async fn test_internal_error_is_opaque() {
    let app = app_with(Arc::new(UnavailableStore));

    let requests = [
        (Method::GET, "/account/1/balance", None),
        (
            Method::PUT,
            "/account/change-balance",
            Some(json!({ "id": 1, "delta": 10 })),
        ),
        (
            Method::PUT,
            "/account/transfer",
            Some(json!({ "id1": 1, "id2": 2, "delta": 10 })),
        ),
        (Method::GET, "/account/1/history", None),
    ];

    for (method, uri, body) in requests {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "internal server error");

        let text = body.to_string();
        assert!(!text.contains("db-primary"), "{text}");
        assert!(!text.contains("balance_rw"), "{text}");
    }
}
