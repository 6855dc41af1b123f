//! The Persistence Gateway seam and its JSON wire types.
//!
//! The gateway owns durable client and entry state and assigns permanent ids.
//! Everything crossing it uses storage-encoded dates (`YYYY-MM-DD`).

use async_trait::async_trait;
use ledgerbook_shared::{ClientId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An entry as stored by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    /// Server-assigned id.
    pub id: TransactionId,
    /// Owning client.
    pub client_id: ClientId,
    /// Storage-encoded date, possibly with a time suffix.
    pub date: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Credited quantity.
    pub credit: Decimal,
    /// Debited quantity.
    pub debit: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Stored total.
    pub total: Decimal,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Owning client.
    pub client_id: ClientId,
    /// Storage-encoded date.
    pub date: String,
    /// Free-text description.
    pub description: String,
    /// Credited quantity.
    pub credit: Decimal,
    /// Debited quantity.
    pub debit: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Derived total.
    pub total: Decimal,
}

/// Body of `PUT /transactions/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    /// Storage-encoded date.
    pub date: String,
    /// Free-text description.
    pub description: String,
    /// Credited quantity.
    pub credit: Decimal,
    /// Debited quantity.
    pub debit: Decimal,
    /// Unit price.
    pub price: Decimal,
    /// Derived total.
    pub total: Decimal,
}

/// A client as returned by `GET /clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Server-assigned id.
    pub id: ClientId,
    /// Display name.
    pub name: String,
}

/// Body of `POST /clients`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    /// Display name.
    pub name: String,
}

/// Error body returned by every failing gateway endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message, shown to the user.
    pub error: String,
    /// Extra diagnostic data, logged but not shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    /// Creates an error body without details.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    /// Attaches diagnostic details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Errors reported by a [`PersistenceGateway`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The gateway could not be reached.
    #[error("Persistence gateway unreachable: {0}")]
    Network(String),

    /// The target of an update or delete does not exist.
    #[error("{error}")]
    NotFound {
        /// Message from the error body.
        error: String,
        /// Details from the error body.
        details: Option<Value>,
    },

    /// Any other non-success response.
    #[error("{error} (HTTP {status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the error body.
        error: String,
        /// Details from the error body.
        details: Option<Value>,
    },

    /// The response could not be understood.
    #[error("Unexpected gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Classifies an error body by its HTTP status.
    #[must_use]
    pub fn from_error_body(status: u16, body: ErrorBody) -> Self {
        if status == 404 {
            Self::NotFound {
                error: body.error,
                details: body.details,
            }
        } else {
            Self::Rejected {
                status,
                error: body.error,
                details: body.details,
            }
        }
    }

    /// The message to surface to the user.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => "Could not reach the server.",
            Self::NotFound { error, .. } | Self::Rejected { error, .. } => error,
            Self::Decode(_) => "The server sent an unexpected response.",
        }
    }

    /// Diagnostic details, if the gateway sent any.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::NotFound { details, .. } | Self::Rejected { details, .. } => details.as_ref(),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    /// Returns true if the target did not exist on the server.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Durable storage for clients and their ledger entries.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Lists a client's entries, ordered by date ascending.
    async fn list_entries(&self, client_id: ClientId) -> Result<Vec<StoredEntry>, GatewayError>;

    /// Creates an entry and returns it with its permanent id.
    async fn create_entry(&self, entry: &NewEntry) -> Result<StoredEntry, GatewayError>;

    /// Replaces the mutable fields of an existing entry.
    async fn update_entry(
        &self,
        id: TransactionId,
        update: &EntryUpdate,
    ) -> Result<StoredEntry, GatewayError>;

    /// Deletes an entry.
    async fn delete_entry(&self, id: TransactionId) -> Result<(), GatewayError>;

    /// Lists all clients.
    async fn list_clients(&self) -> Result<Vec<Client>, GatewayError>;

    /// Creates a client.
    async fn create_client(&self, client: &NewClient) -> Result<Client, GatewayError>;
}
