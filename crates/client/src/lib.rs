//! HTTP client for the Ledgerbook Persistence Gateway.
//!
//! [`HttpGateway`] implements [`PersistenceGateway`] over the REST endpoints
//! served by `ledgerbook-api`, so a [`Reconciler`](ledgerbook_core::ledger::Reconciler)
//! can run against a remote server.

use std::time::Duration;

use async_trait::async_trait;
use ledgerbook_core::ledger::{
    Client, EntryUpdate, ErrorBody, GatewayError, NewClient, NewEntry, PersistenceGateway,
    StoredEntry,
};
use ledgerbook_shared::{ClientId, GatewayConfig, TransactionId};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

/// [`PersistenceGateway`] backed by the REST API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Builds a client for the API at `config.base_url`.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "Gateway response");
        if status.is_success() {
            return Ok(response);
        }

        let raw = response.bytes().await.unwrap_or_default();
        let body = serde_json::from_slice::<ErrorBody>(&raw).unwrap_or_else(|_| {
            ErrorBody::new(status.canonical_reason().unwrap_or("Request failed"))
        });
        Err(GatewayError::from_error_body(status.as_u16(), body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let raw = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        serde_json::from_slice(&raw).map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn list_entries(&self, client_id: ClientId) -> Result<Vec<StoredEntry>, GatewayError> {
        let request = self
            .client
            .get(self.url("/transactions"))
            .query(&[("clientId", client_id.into_inner())]);
        self.fetch(request).await
    }

    async fn create_entry(&self, entry: &NewEntry) -> Result<StoredEntry, GatewayError> {
        let request = self.client.post(self.url("/transactions")).json(entry);
        self.fetch(request).await
    }

    async fn update_entry(
        &self,
        id: TransactionId,
        update: &EntryUpdate,
    ) -> Result<StoredEntry, GatewayError> {
        let request = self
            .client
            .put(self.url(&format!("/transactions/{id}")))
            .json(update);
        self.fetch(request).await
    }

    async fn delete_entry(&self, id: TransactionId) -> Result<(), GatewayError> {
        let request = self.client.delete(self.url(&format!("/transactions/{id}")));
        self.send(request).await.map(|_| ())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, GatewayError> {
        self.fetch(self.client.get(self.url("/clients"))).await
    }

    async fn create_client(&self, client: &NewClient) -> Result<Client, GatewayError> {
        let request = self.client.post(self.url("/clients")).json(client);
        self.fetch(request).await
    }
}
