//! Client ledger bookkeeping.
//!
//! This module implements the core ledger functionality:
//! - Ledger entries and the derived `total`
//! - Running balances and the grand total
//! - Date normalization between display and storage encodings
//! - The Persistence Gateway seam
//! - Save reconciliation of pending and persisted entries

pub mod balance;
pub mod book;
pub mod date;
pub mod entry;
pub mod error;
pub mod gateway;
pub mod reconcile;

#[cfg(test)]
mod date_props;
#[cfg(test)]
mod entry_props;
#[cfg(test)]
mod testing;

pub use balance::{RunningBalance, compute_cumulative, grand_total, running_balances};
pub use book::ClientLedger;
pub use date::{DateError, to_display, to_storage, validate_display};
pub use entry::{
    AMOUNT_SCALE, EntryField, EntryId, FieldUpdate, LedgerEntry, LocalId, RejectReason,
    UnknownField, derive_total, normalize_amount, parse_amount,
};
pub use error::{DeleteError, ReconcileError, SaveError};
pub use gateway::{
    Client, EntryUpdate, ErrorBody, GatewayError, NewClient, NewEntry, PersistenceGateway,
    StoredEntry,
};
pub use reconcile::{Reconciler, SaveFailure, SaveOperation, SaveOutcome};
