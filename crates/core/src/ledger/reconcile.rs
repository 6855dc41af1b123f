//! Reconciliation of locally edited entries with the Persistence Gateway.
//!
//! A save runs in three strictly sequential phases:
//! 1. update every persisted entry, in list order
//! 2. create every pending entry, in list order, swapping the confirmed entry
//!    into the pending entry's position
//! 3. refetch the client's entries to pick up server-side normalization
//!
//! Failures are per entry and never abort the remaining work, so the result is
//! best-effort and may be partially applied.

use std::collections::HashSet;
use std::sync::Arc;

use ledgerbook_shared::{ClientId, TransactionId};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::entry::{EntryId, LedgerEntry, LocalId};
use super::error::{DeleteError, ReconcileError, SaveError};
use super::gateway::{GatewayError, PersistenceGateway, StoredEntry};

/// The phase a save failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOperation {
    /// Updating a persisted entry.
    Update,
    /// Creating a pending entry.
    Create,
    /// Refetching the list after all writes.
    Refetch,
}

/// One failed step of a save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFailure {
    /// The entry that failed, `None` for the refetch.
    pub entry: Option<EntryId>,
    /// Which phase failed.
    pub operation: SaveOperation,
    /// What went wrong.
    pub error: SaveError,
}

/// Result of a save: the reconciled list plus everything that failed.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// The entry list to display after the save.
    pub entries: Vec<LedgerEntry>,
    /// Failed steps, in the order they happened.
    pub failures: Vec<SaveFailure>,
}

impl SaveOutcome {
    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Saves and deletes entries through a [`PersistenceGateway`].
///
/// Only one save or delete runs at a time; a second one started while the
/// first is outstanding is rejected without touching anything.
pub struct Reconciler {
    gateway: Arc<dyn PersistenceGateway>,
    in_flight: Mutex<()>,
}

impl Reconciler {
    /// Creates a reconciler over `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            gateway,
            in_flight: Mutex::new(()),
        }
    }

    /// Fetches a client's entries in display form.
    pub async fn load(&self, client_id: ClientId) -> Result<Vec<LedgerEntry>, GatewayError> {
        let stored = self.gateway.list_entries(client_id).await?;
        to_entries(&stored)
    }

    /// Saves `entries` for `client_id` and returns the reconciled list.
    ///
    /// After a successful refetch the list is the server's list, except that
    /// persisted entries whose update failed keep their unsaved local version
    /// and entries whose create failed stay pending at the end of the list.
    /// If the refetch fails, the locally reconciled list is returned as is.
    pub async fn save(
        &self,
        client_id: ClientId,
        entries: &[LedgerEntry],
    ) -> Result<SaveOutcome, ReconcileError> {
        let _slot = self
            .in_flight
            .try_lock()
            .map_err(|_| ReconcileError::SaveInProgress)?;

        let mut working = entries.to_vec();
        let mut failures = Vec::new();
        let mut failed_updates: HashSet<TransactionId> = HashSet::new();

        for entry in &mut working {
            let EntryId::Persisted(id) = entry.id() else {
                continue;
            };
            match self.update_one(id, entry).await {
                Ok(updated) => *entry = updated,
                Err(error) => {
                    failed_updates.insert(id);
                    failures.push(report(Some(entry.id()), SaveOperation::Update, error));
                }
            }
        }

        let pending: Vec<LocalId> = working
            .iter()
            .filter_map(|entry| match entry.id() {
                EntryId::Pending(local) => Some(local),
                EntryId::Persisted(_) => None,
            })
            .collect();

        for local in pending {
            let Some(position) = working
                .iter()
                .position(|entry| entry.id() == EntryId::Pending(local))
            else {
                continue;
            };
            match self.create_one(client_id, &working[position]).await {
                Ok(created) => working[position] = created,
                Err(error) => {
                    failures.push(report(Some(EntryId::Pending(local)), SaveOperation::Create, error));
                }
            }
        }

        match self.load(client_id).await {
            Ok(fetched) => working = merge_refetched(fetched, working, &failed_updates),
            Err(error) => failures.push(report(None, SaveOperation::Refetch, error.into())),
        }

        info!(
            client_id = %client_id,
            entries = working.len(),
            failures = failures.len(),
            "Ledger saved"
        );

        Ok(SaveOutcome {
            entries: working,
            failures,
        })
    }

    /// Removes the entry `id` from `entries`.
    ///
    /// Pending entries are dropped locally. Persisted entries are removed only
    /// after the gateway confirms the delete; on any failure the list is left
    /// unchanged.
    pub async fn delete(
        &self,
        entries: &mut Vec<LedgerEntry>,
        id: EntryId,
    ) -> Result<(), DeleteError> {
        let _slot = self
            .in_flight
            .try_lock()
            .map_err(|_| DeleteError::SaveInProgress)?;

        let position = entries
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or(DeleteError::NotInLedger(id))?;

        if let EntryId::Persisted(transaction_id) = id {
            if let Err(error) = self.gateway.delete_entry(transaction_id).await {
                warn!(
                    entry = %id,
                    error = %error,
                    details = ?error.details(),
                    "Delete failed"
                );
                return Err(error.into());
            }
        }

        entries.remove(position);
        Ok(())
    }

    async fn update_one(
        &self,
        id: TransactionId,
        entry: &LedgerEntry,
    ) -> Result<LedgerEntry, SaveError> {
        let update = entry.entry_update()?;
        let stored = self.gateway.update_entry(id, &update).await?;
        Ok(to_entry(&stored)?)
    }

    async fn create_one(
        &self,
        client_id: ClientId,
        entry: &LedgerEntry,
    ) -> Result<LedgerEntry, SaveError> {
        let new_entry = entry.new_entry(client_id)?;
        let stored = self.gateway.create_entry(&new_entry).await?;
        Ok(to_entry(&stored)?)
    }
}

fn report(entry: Option<EntryId>, operation: SaveOperation, error: SaveError) -> SaveFailure {
    warn!(
        entry = ?entry.map(|id| id.to_string()),
        ?operation,
        error = %error,
        details = ?error.details(),
        "Save step failed"
    );
    SaveFailure {
        entry,
        operation,
        error,
    }
}

fn to_entry(stored: &StoredEntry) -> Result<LedgerEntry, GatewayError> {
    if !stored.id.is_assigned() {
        return Err(GatewayError::Decode(format!(
            "Server returned invalid transaction id {}",
            stored.id
        )));
    }
    LedgerEntry::from_stored(stored).map_err(|err| GatewayError::Decode(err.to_string()))
}

fn to_entries(stored: &[StoredEntry]) -> Result<Vec<LedgerEntry>, GatewayError> {
    stored.iter().map(to_entry).collect()
}

/// Server list first; local entries the server cannot know about are kept.
pub(crate) fn merge_refetched(
    fetched: Vec<LedgerEntry>,
    local: Vec<LedgerEntry>,
    failed_updates: &HashSet<TransactionId>,
) -> Vec<LedgerEntry> {
    let fetched_ids: HashSet<EntryId> = fetched.iter().map(LedgerEntry::id).collect();

    let mut merged: Vec<LedgerEntry> = fetched
        .into_iter()
        .map(|server| {
            let keep_local = server
                .id()
                .transaction_id()
                .is_some_and(|id| failed_updates.contains(&id));
            if keep_local {
                local
                    .iter()
                    .find(|entry| entry.id() == server.id())
                    .cloned()
                    .unwrap_or(server)
            } else {
                server
            }
        })
        .collect();

    merged.extend(local.into_iter().filter(|entry| match entry.id() {
        EntryId::Pending(_) => true,
        EntryId::Persisted(id) => failed_updates.contains(&id) && !fetched_ids.contains(&entry.id()),
    }));

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::EntryField;
    use crate::ledger::testing::MockGateway;
    use rust_decimal_macros::dec;
    use tokio::sync::Notify;

    fn stored(id: i32, date: &str, description: &str) -> StoredEntry {
        StoredEntry {
            id: TransactionId(id),
            client_id: ClientId(1),
            date: date.to_string(),
            description: description.to_string(),
            credit: dec!(0),
            debit: dec!(1),
            price: dec!(1),
            total: dec!(1),
        }
    }

    fn pending(local: u64, description: &str) -> LedgerEntry {
        let mut entry = LedgerEntry::pending(LocalId(local), "01/06/2024");
        entry.update_field(EntryField::Description, description);
        entry
    }

    fn reconciler(gateway: &Arc<MockGateway>) -> Reconciler {
        Reconciler::new(gateway.clone())
    }

    #[tokio::test]
    async fn test_pending_entry_gets_server_id() {
        let gateway = Arc::new(MockGateway::starting_at(41));
        let mut entry = LedgerEntry::pending(LocalId(1_700_000_000_000), "01/06/2024");
        entry.update_field(EntryField::Credit, "0");
        entry.update_field(EntryField::Debit, "5");
        entry.update_field(EntryField::Price, "2");

        let outcome = reconciler(&gateway)
            .save(ClientId(1), &[entry])
            .await
            .unwrap();

        assert!(outcome.is_clean());
        assert_eq!(outcome.entries.len(), 1);
        let saved = &outcome.entries[0];
        assert_eq!(saved.id(), EntryId::Persisted(TransactionId(42)));
        assert_eq!(saved.date(), "01/06/2024");
        assert_eq!(saved.total(), dec!(10));
        assert!(
            !outcome
                .entries
                .iter()
                .any(|e| e.id() == EntryId::Pending(LocalId(1_700_000_000_000)))
        );
    }

    #[tokio::test]
    async fn test_failed_create_stays_pending() {
        let gateway = Arc::new(MockGateway::starting_at(10));
        gateway.fail_creates();

        let outcome = reconciler(&gateway)
            .save(ClientId(1), &[pending(7, "Seeds")])
            .await
            .unwrap();

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].id(), EntryId::Pending(LocalId(7)));
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.operation, SaveOperation::Create);
        assert_eq!(failure.entry, Some(EntryId::Pending(LocalId(7))));
        assert_eq!(failure.error.user_message(), "Failed to create transaction.");
    }

    #[tokio::test]
    async fn test_updates_run_before_creates_in_list_order() {
        let gateway = Arc::new(
            MockGateway::starting_at(100)
                .with_stored(stored(1, "2024-01-01", "a"))
                .with_stored(stored(2, "2024-01-02", "b")),
        );
        let r = reconciler(&gateway);
        let mut entries = r.load(ClientId(1)).await.unwrap();
        entries.insert(1, pending(1, "new-1"));
        entries.push(pending(2, "new-2"));

        r.save(ClientId(1), &entries).await.unwrap();

        assert_eq!(
            gateway.calls(),
            vec!["list 1", "update 1", "update 2", "create new-1", "create new-2", "list 1"]
        );
    }

    #[tokio::test]
    async fn test_created_entry_replaces_pending_at_same_position() {
        let gateway = Arc::new(MockGateway::starting_at(100));
        gateway.fail_list();
        let entries = vec![pending(1, "first"), pending(2, "second")];

        let outcome = reconciler(&gateway).save(ClientId(1), &entries).await.unwrap();

        // Refetch failed, so the locally reconciled order is kept.
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].operation, SaveOperation::Refetch);
        assert_eq!(outcome.failures[0].entry, None);
        assert_eq!(outcome.entries[0].id(), EntryId::Persisted(TransactionId(101)));
        assert_eq!(outcome.entries[0].description(), "first");
        assert_eq!(outcome.entries[1].id(), EntryId::Persisted(TransactionId(102)));
        assert_eq!(outcome.entries[1].description(), "second");
    }

    #[tokio::test]
    async fn test_failed_update_keeps_local_edit_and_continues() {
        let gateway = Arc::new(
            MockGateway::starting_at(100)
                .with_stored(stored(1, "2024-01-01", "a"))
                .with_stored(stored(2, "2024-01-02", "b")),
        );
        gateway.fail_update(TransactionId(1));
        let r = reconciler(&gateway);

        let mut entries = r.load(ClientId(1)).await.unwrap();
        entries[0].update_field(EntryField::Description, "edited a");
        entries[1].update_field(EntryField::Description, "edited b");

        let outcome = r.save(ClientId(1), &entries).await.unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].operation, SaveOperation::Update);
        assert!(matches!(
            &outcome.failures[0].error,
            SaveError::Gateway(e) if e.is_not_found()
        ));
        assert_eq!(outcome.entries[0].description(), "edited a");
        assert_eq!(outcome.entries[1].description(), "edited b");
        assert_eq!(gateway.stored()[0].description, "a");
        assert_eq!(gateway.stored()[1].description, "edited b");
    }

    #[tokio::test]
    async fn test_refetch_resyncs_order_from_server() {
        let gateway = Arc::new(
            MockGateway::starting_at(100).with_stored(stored(1, "2024-03-01", "march")),
        );
        let r = reconciler(&gateway);
        let mut entries = r.load(ClientId(1)).await.unwrap();
        let mut january = pending(1, "january");
        january.update_field(EntryField::Date, "15/01/2024");
        entries.push(january);

        let outcome = r.save(ClientId(1), &entries).await.unwrap();

        assert!(outcome.is_clean());
        let descriptions: Vec<&str> = outcome.entries.iter().map(LedgerEntry::description).collect();
        assert_eq!(descriptions, vec!["january", "march"]);
    }

    #[tokio::test]
    async fn test_second_save_is_rejected_while_first_runs() {
        let gate = Arc::new(Notify::new());
        let gateway = Arc::new(MockGateway::starting_at(0).with_list_gate(gate.clone()));
        let r = reconciler(&gateway);
        let entries = vec![pending(1, "only")];

        let first = r.save(ClientId(1), &entries);
        let second = async {
            let result = r.save(ClientId(1), &entries).await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), ReconcileError::SaveInProgress);
        assert_eq!(gateway.stored().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_pending_is_local_only() {
        let gateway = Arc::new(MockGateway::starting_at(0));
        let mut entries = vec![pending(1, "a"), pending(2, "b")];

        reconciler(&gateway)
            .delete(&mut entries, EntryId::Pending(LocalId(1)))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description(), "b");
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_persisted_requires_gateway_success() {
        let gateway = Arc::new(
            MockGateway::starting_at(0).with_stored(stored(5, "2024-01-01", "kept")),
        );
        let r = reconciler(&gateway);
        let mut entries = r.load(ClientId(1)).await.unwrap();
        let ghost = LedgerEntry::from_stored(&stored(6, "2024-01-02", "ghost")).unwrap();
        entries.push(ghost);

        let err = r
            .delete(&mut entries, EntryId::Persisted(TransactionId(6)))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(entries.len(), 2);

        r.delete(&mut entries, EntryId::Persisted(TransactionId(5)))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert!(gateway.stored().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_entry() {
        let gateway = Arc::new(MockGateway::starting_at(0));
        let mut entries = Vec::new();
        let err = reconciler(&gateway)
            .delete(&mut entries, EntryId::Pending(LocalId(3)))
            .await
            .unwrap_err();
        assert_eq!(err, DeleteError::NotInLedger(EntryId::Pending(LocalId(3))));
    }

    #[test]
    fn test_merge_keeps_unsaved_and_pending_entries() {
        let server = vec![
            LedgerEntry::from_stored(&stored(1, "2024-01-01", "server one")).unwrap(),
            LedgerEntry::from_stored(&stored(2, "2024-01-02", "server two")).unwrap(),
        ];
        let mut local_one = LedgerEntry::from_stored(&stored(1, "2024-01-01", "one")).unwrap();
        local_one.update_field(EntryField::Description, "unsaved one");
        let vanished = LedgerEntry::from_stored(&stored(9, "2024-01-09", "gone")).unwrap();
        let local = vec![local_one, pending(4, "still pending"), vanished];
        let failed: HashSet<TransactionId> = [TransactionId(1), TransactionId(9)].into();

        let merged = merge_refetched(server, local, &failed);

        let descriptions: Vec<&str> = merged.iter().map(LedgerEntry::description).collect();
        assert_eq!(
            descriptions,
            vec!["unsaved one", "server two", "still pending", "gone"]
        );
    }

    #[test]
    fn test_unassigned_server_ids_are_decode_errors() {
        for id in [0, -4] {
            let err = to_entries(&[stored(1, "2024-01-01", "ok"), stored(id, "2024-01-02", "bad")])
                .unwrap_err();
            assert!(matches!(err, GatewayError::Decode(ref msg) if msg.contains("invalid transaction id")));
        }
        assert_eq!(to_entries(&[stored(1, "2024-01-01", "ok")]).unwrap().len(), 1);
    }
}
