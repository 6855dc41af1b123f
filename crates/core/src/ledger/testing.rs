//! In-memory gateway used by the reconciliation tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledgerbook_shared::{ClientId, TransactionId};
use tokio::sync::Notify;

use super::gateway::{
    Client, EntryUpdate, ErrorBody, GatewayError, NewClient, NewEntry, PersistenceGateway,
    StoredEntry,
};

#[derive(Default)]
struct State {
    entries: Vec<StoredEntry>,
    clients: Vec<Client>,
    next_id: i32,
    fail_creates: bool,
    fail_updates: HashSet<TransactionId>,
    fail_list: bool,
    calls: Vec<String>,
}

/// Stores entries in memory and can be told to fail specific calls.
#[derive(Default)]
pub(crate) struct MockGateway {
    state: Mutex<State>,
    list_gate: Option<Arc<Notify>>,
}

impl MockGateway {
    pub(crate) fn starting_at(next_id: i32) -> Self {
        let gateway = Self::default();
        gateway.state.lock().unwrap().next_id = next_id;
        gateway
    }

    pub(crate) fn with_stored(self, entry: StoredEntry) -> Self {
        self.state.lock().unwrap().entries.push(entry);
        self
    }

    pub(crate) fn with_list_gate(mut self, gate: Arc<Notify>) -> Self {
        self.list_gate = Some(gate);
        self
    }

    pub(crate) fn fail_creates(&self) {
        self.state.lock().unwrap().fail_creates = true;
    }

    pub(crate) fn fail_update(&self, id: TransactionId) {
        self.state.lock().unwrap().fail_updates.insert(id);
    }

    pub(crate) fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn stored(&self) -> Vec<StoredEntry> {
        self.state.lock().unwrap().entries.clone()
    }
}

fn not_found() -> GatewayError {
    GatewayError::from_error_body(404, ErrorBody::new("Transaction not found."))
}

#[async_trait]
impl PersistenceGateway for MockGateway {
    async fn list_entries(&self, client_id: ClientId) -> Result<Vec<StoredEntry>, GatewayError> {
        if let Some(gate) = &self.list_gate {
            gate.notified().await;
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("list {client_id}"));
        if state.fail_list {
            return Err(GatewayError::Network("connection refused".to_string()));
        }
        let mut entries: Vec<StoredEntry> = state
            .entries
            .iter()
            .filter(|e| e.client_id == client_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    async fn create_entry(&self, entry: &NewEntry) -> Result<StoredEntry, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {}", entry.description));
        if state.fail_creates {
            return Err(GatewayError::from_error_body(
                500,
                ErrorBody::new("Failed to create transaction.").with_details("disk full"),
            ));
        }
        state.next_id += 1;
        let stored = StoredEntry {
            id: TransactionId(state.next_id),
            client_id: entry.client_id,
            date: format!("{}T00:00:00.000Z", entry.date),
            description: entry.description.clone(),
            credit: entry.credit,
            debit: entry.debit,
            price: entry.price,
            total: entry.total,
        };
        state.entries.push(stored.clone());
        Ok(stored)
    }

    async fn update_entry(
        &self,
        id: TransactionId,
        update: &EntryUpdate,
    ) -> Result<StoredEntry, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("update {id}"));
        if state.fail_updates.contains(&id) {
            return Err(not_found());
        }
        let Some(stored) = state.entries.iter_mut().find(|e| e.id == id) else {
            return Err(not_found());
        };
        stored.date = update.date.clone();
        stored.description = update.description.clone();
        stored.credit = update.credit;
        stored.debit = update.debit;
        stored.price = update.price;
        stored.total = update.total;
        Ok(stored.clone())
    }

    async fn delete_entry(&self, id: TransactionId) -> Result<(), GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("delete {id}"));
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        if state.entries.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn list_clients(&self) -> Result<Vec<Client>, GatewayError> {
        Ok(self.state.lock().unwrap().clients.clone())
    }

    async fn create_client(&self, client: &NewClient) -> Result<Client, GatewayError> {
        let mut state = self.state.lock().unwrap();
        let created = Client {
            id: ClientId(i32::try_from(state.clients.len()).unwrap() + 1),
            name: client.name.clone(),
        };
        state.clients.push(created.clone());
        Ok(created)
    }
}
