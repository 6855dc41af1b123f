//! Client routes.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use ledgerbook_db::{ClientRepository, entities::clients};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the client routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/clients", get(list_clients).post(create_client))
}

/// Request body for creating a client.
#[derive(Debug, Deserialize)]
pub struct CreateClientRequest {
    /// Display name; trimmed before storing.
    #[serde(default)]
    pub name: Option<String>,
}

/// Response for a client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    /// Client ID.
    pub id: i32,
    /// Display name.
    pub name: String,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<clients::Model> for ClientResponse {
    fn from(model: clients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// GET `/clients` - List all clients.
async fn list_clients(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = ClientRepository::new(state.db.clone());
    let clients = repo
        .list()
        .await
        .map_err(|e| ApiError::database("Failed to fetch clients.", &e))?;

    let items: Vec<ClientResponse> = clients.into_iter().map(ClientResponse::from).collect();
    Ok(Json(items))
}

/// POST `/clients` - Create a client.
async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let name = payload.name.as_deref().map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::validation("Name is required."));
    }

    let repo = ClientRepository::new(state.db.clone());
    let client = repo
        .create(name)
        .await
        .map_err(|e| ApiError::database("Failed to create client.", &e))?;

    info!(client_id = client.id, "Client created");
    Ok((StatusCode::CREATED, Json(ClientResponse::from(client))))
}
