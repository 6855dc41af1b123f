//! The working copy of one client's ledger.

use ledgerbook_shared::ClientId;
use rust_decimal::Decimal;
use tracing::debug;

use super::balance::{self, RunningBalance};
use super::date;
use super::entry::{EntryField, EntryId, FieldUpdate, LedgerEntry, LocalId};
use super::error::{DeleteError, ReconcileError};
use super::gateway::GatewayError;
use super::reconcile::{Reconciler, SaveFailure};

/// A client's entries as currently edited, plus the counter for new rows.
#[derive(Debug, Clone)]
pub struct ClientLedger {
    client_id: ClientId,
    entries: Vec<LedgerEntry>,
    next_local: u64,
}

impl ClientLedger {
    /// Creates a ledger from already loaded entries.
    #[must_use]
    pub const fn new(client_id: ClientId, entries: Vec<LedgerEntry>) -> Self {
        Self {
            client_id,
            entries,
            next_local: 1,
        }
    }

    /// Loads a client's ledger through `reconciler`.
    pub async fn open(reconciler: &Reconciler, client_id: ClientId) -> Result<Self, GatewayError> {
        let entries = reconciler.load(client_id).await?;
        Ok(Self::new(client_id, entries))
    }

    /// The owning client.
    #[must_use]
    pub const fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Entries in display order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the ledger has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a blank pending row dated today.
    pub fn add_row(&mut self) -> EntryId {
        self.push_pending(date::today_display())
    }

    fn push_pending(&mut self, date: String) -> EntryId {
        let local = LocalId(self.next_local);
        self.next_local += 1;
        let entry = LedgerEntry::pending(local, date);
        let id = entry.id();
        self.entries.push(entry);
        debug!(client_id = %self.client_id, entry = %id, "Added pending row");
        id
    }

    /// Applies a raw edit to one entry; `None` if the entry is not in the ledger.
    pub fn update_field(&mut self, id: EntryId, field: EntryField, raw: &str) -> Option<FieldUpdate> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id() == id)
            .map(|entry| entry.update_field(field, raw))
    }

    /// Cumulative totals in display order.
    #[must_use]
    pub fn cumulative(&self) -> Vec<Decimal> {
        balance::compute_cumulative(&self.entries)
    }

    /// Sum of every entry total.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        balance::grand_total(&self.entries)
    }

    /// Previous and current balance for each row.
    #[must_use]
    pub fn running_balances(&self) -> Vec<RunningBalance> {
        balance::running_balances(&self.entries)
    }

    /// Saves every entry and replaces the working copy with the reconciled list.
    ///
    /// Returns the per-entry failures; an empty list means everything was
    /// saved and refetched.
    pub async fn save(&mut self, reconciler: &Reconciler) -> Result<Vec<SaveFailure>, ReconcileError> {
        let outcome = reconciler.save(self.client_id, &self.entries).await?;
        self.entries = outcome.entries;
        Ok(outcome.failures)
    }

    /// Deletes an entry, through the gateway if it is persisted.
    pub async fn delete(&mut self, reconciler: &Reconciler, id: EntryId) -> Result<(), DeleteError> {
        reconciler.delete(&mut self.entries, id).await
    }

    /// Reloads persisted entries from the gateway, keeping unsaved pending rows.
    pub async fn refresh(&mut self, reconciler: &Reconciler) -> Result<(), GatewayError> {
        let mut fetched = reconciler.load(self.client_id).await?;
        fetched.extend(self.entries.drain(..).filter(|entry| entry.id().is_pending()));
        self.entries = fetched;
        Ok(())
    }
}
