//! HTTP adapter over [`BalanceService`].

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use userbalance_common::{AccountId, LedgerError, OperationId};
use userbalance_ledger::{ConnectionMonitor, TransactionRecord};

use crate::service::{BalanceService, BalanceView};

const BAD_REQUEST: &str = "BAD_REQUEST";
const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub sort_by: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChangeBalanceRequest {
    pub id: AccountId,
    pub delta: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub id1: AccountId,
    pub id2: AccountId,
    pub delta: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: AccountId,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub currency: String,
}

impl From<BalanceView> for BalanceResponse {
    fn from(view: BalanceView) -> Self {
        Self {
            id: view.id,
            balance: view.balance,
            currency: view.currency.code().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub account_id: AccountId,
    pub operation_id: OperationId,
    #[serde(with = "rust_decimal::serde::float")]
    pub delta: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub resulting_balance: Decimal,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            account_id: record.account_id,
            operation_id: record.operation_id,
            delta: record.delta,
            resulting_balance: record.resulting_balance,
            message: record.message,
            created_at: record.created_at,
        }
    }
}

/// Datastore health as seen by the connectivity monitor, if one runs.
#[derive(Clone, Default)]
pub struct HealthState {
    pub monitor: Option<ConnectionMonitor>,
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Map a ledger error onto a response. Internal details are logged, never
/// returned.
pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let code = err.error_code();
    match err {
        LedgerError::WrongInput(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        LedgerError::InsufficientFunds { .. } => {
            info!(error = %err, "Operation rejected");
            json_error(StatusCode::FORBIDDEN, code, err.to_string())
        }
        LedgerError::Internal(detail) => {
            error!(error = %detail, "Internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "internal server error")
        }
    }
}

/// Build the router. Every route shares one [`BalanceService`].
pub fn router(service: Arc<BalanceService>, health: HealthState) -> Router {
    Router::new()
        .route("/alive", get(alive))
        .route("/health", get(health_check))
        .route("/account/:id/balance", get(get_balance))
        .route("/account/change-balance", put(change_balance))
        .route("/account/transfer", put(transfer))
        .route("/account/:id/history", get(history))
        .layer(Extension(service))
        .layer(Extension(health))
}

pub async fn alive() -> &'static str {
    "Hello from balance service"
}

pub async fn health_check(Extension(health): Extension<HealthState>) -> axum::response::Response {
    match &health.monitor {
        Some(monitor) if !monitor.is_healthy() => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": "down" })),
        )
            .into_response(),
        Some(_) => Json(json!({ "status": "ok", "database": "up" })).into_response(),
        None => Json(json!({ "status": "ok" })).into_response(),
    }
}

pub async fn get_balance(
    Extension(service): Extension<Arc<BalanceService>>,
    id: Result<Path<AccountId>, PathRejection>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> axum::response::Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };

    match service
        .get_balance_display(id, query.currency.as_deref())
        .await
    {
        Ok(view) => Json(BalanceResponse::from(view)).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

pub async fn change_balance(
    Extension(service): Extension<Arc<BalanceService>>,
    body: Result<Json<ChangeBalanceRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };

    match service.change_balance(body.id, body.delta).await {
        Ok(message) => Json(MessageResponse { message }).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

pub async fn transfer(
    Extension(service): Extension<Arc<BalanceService>>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };

    match service.transfer(body.id1, body.id2, body.delta).await {
        Ok(message) => Json(MessageResponse { message }).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

pub async fn history(
    Extension(service): Extension<Arc<BalanceService>>,
    id: Result<Path<AccountId>, PathRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> axum::response::Response {
    let Path(id) = match id {
        Ok(id) => id,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, BAD_REQUEST, e.body_text()),
    };

    match service
        .history(id, query.sort_by.as_deref(), query.descending)
        .await
    {
        Ok(records) if records.is_empty() => json_error(
            StatusCode::NOT_FOUND,
            NOT_FOUND,
            format!("no transactions for account {id}"),
        ),
        Ok(records) => Json(
            records
                .into_iter()
                .map(TransactionResponse::from)
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}
