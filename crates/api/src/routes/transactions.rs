//! Ledger transaction routes.
//!
//! Dates are accepted as `YYYY-MM-DD`, optionally with a time suffix, and
//! always returned as bare `YYYY-MM-DD`. The stored `total` is derived from
//! the stored amounts; a `total` sent by the caller is only checked.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::NaiveDate;
use ledgerbook_core::ledger::date;
use ledgerbook_db::{
    TransactionRepository,
    entities::transactions,
    repositories::{CreateTransactionInput, UpdateTransactionInput},
};
use ledgerbook_shared::{ClientId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::{AppState, error::ApiError};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/{id}",
            put(update_transaction).delete(delete_transaction),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Owning client.
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Owning client.
    pub client_id: Option<ClientId>,
    /// Storage-encoded date.
    pub date: Option<String>,
    /// Description, empty when omitted.
    #[serde(default)]
    pub description: Option<String>,
    /// Credited quantity, zero when omitted.
    #[serde(default)]
    pub credit: Option<Decimal>,
    /// Debited quantity, zero when omitted.
    #[serde(default)]
    pub debit: Option<Decimal>,
    /// Unit price, zero when omitted.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Total as computed by the caller.
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Request body for updating a transaction.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// Storage-encoded date.
    pub date: Option<String>,
    /// Description; missing or empty keeps the stored one.
    #[serde(default)]
    pub description: Option<String>,
    /// Credited quantity; missing keeps the stored one.
    #[serde(default)]
    pub credit: Option<Decimal>,
    /// Debited quantity; missing keeps the stored one.
    #[serde(default)]
    pub debit: Option<Decimal>,
    /// Unit price; missing keeps the stored one.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Total as computed by the caller.
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: i32,
    /// Owning client.
    pub client_id: i32,
    /// Date as `YYYY-MM-DD`.
    pub date: String,
    /// Description.
    pub description: String,
    /// Credited quantity.
    pub credit: Decimal,
    /// Debited quantity.
    pub debit: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// `(debit - credit) * price`.
    pub total: Decimal,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            date: date::format_storage(model.date),
            description: model.description,
            credit: model.credit,
            debit: model.debit,
            price: model.price,
            total: model.total,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/transactions?clientId=` - List a client's transactions by date.
async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let raw = query
        .client_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::validation("clientId is required."))?;
    let client_id: ClientId = raw
        .parse()
        .map_err(|_| ApiError::validation("clientId must be a number."))?;

    let repo = TransactionRepository::new(state.db.clone());
    let rows = repo
        .list_for_client(client_id)
        .await
        .map_err(|e| ApiError::database("Failed to fetch transactions.", &e))?;

    let items: Vec<TransactionResponse> = rows.into_iter().map(TransactionResponse::from).collect();
    Ok(Json(items))
}

/// POST `/transactions` - Create a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let (Some(client_id), Some(raw_date)) = (payload.client_id, payload.date.as_deref()) else {
        return Err(ApiError::validation("clientId and date are required."));
    };
    let date = parse_date(raw_date)?;

    let repo = TransactionRepository::new(state.db.clone());
    let created = repo
        .create(CreateTransactionInput {
            client_id,
            date,
            description: payload.description.unwrap_or_default(),
            credit: payload.credit.unwrap_or_default(),
            debit: payload.debit.unwrap_or_default(),
            price: payload.price.unwrap_or_default(),
        })
        .await
        .map_err(|e| ApiError::from_transaction("Failed to create transaction.", &e))?;

    check_total(created.id, payload.total, created.total);
    info!(id = created.id, client_id = created.client_id, "Transaction created");
    Ok((StatusCode::CREATED, Json(TransactionResponse::from(created))))
}

/// PUT `/transactions/{id}` - Update a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let raw_date = payload
        .date
        .as_deref()
        .ok_or_else(|| ApiError::validation("Date is required."))?;
    let date = parse_date(raw_date)?;

    let repo = TransactionRepository::new(state.db.clone());
    let updated = repo
        .update(
            TransactionId(id),
            UpdateTransactionInput {
                date,
                description: payload.description,
                credit: payload.credit,
                debit: payload.debit,
                price: payload.price,
            },
        )
        .await
        .map_err(|e| ApiError::from_transaction("Failed to update transaction.", &e))?;

    check_total(updated.id, payload.total, updated.total);
    Ok(Json(TransactionResponse::from(updated)))
}

/// DELETE `/transactions/{id}` - Delete a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let repo = TransactionRepository::new(state.db.clone());
    repo.delete(TransactionId(id))
        .await
        .map_err(|e| ApiError::from_transaction("Failed to delete transaction.", &e))?;

    info!(id, "Transaction deleted");
    Ok(Json(json!({ "message": "Transaction deleted successfully." })))
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    date::parse_storage(raw).map_err(|e| ApiError::validation(e.to_string()))
}

fn check_total(id: i32, claimed: Option<Decimal>, stored: Decimal) {
    if let Some(claimed) = claimed
        && claimed != stored
    {
        warn!(id, %claimed, %stored, "Ignoring client total that disagrees with amounts");
    }
}
