//! Ledger error types for saving and deleting entries.
//!
//! Field edits never fail (see `FieldUpdate`); only gateway round-trips do.
//! A failing entry never aborts the others, so most of these errors end up
//! collected in a save report rather than returned early.

use serde_json::Value;
use thiserror::Error;

use super::date::DateError;
use super::entry::EntryId;
use super::gateway::GatewayError;

/// Errors that stop a save or delete before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// Another save is still running against the same reconciler.
    #[error("A save is already in progress")]
    SaveInProgress,
}

/// Why a single entry could not be saved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SaveError {
    /// The gateway rejected the request or could not be reached.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The entry's date could not be converted to storage encoding.
    #[error(transparent)]
    InvalidDate(#[from] DateError),
}

impl SaveError {
    /// The message to surface to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Gateway(err) => err.user_message().to_string(),
            Self::InvalidDate(err) => err.to_string(),
        }
    }

    /// Diagnostic details, if the gateway sent any.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        match self {
            Self::Gateway(err) => err.details(),
            Self::InvalidDate(_) => None,
        }
    }
}

/// Errors from deleting an entry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeleteError {
    /// The entry is not in the ledger.
    #[error("Entry {0} is not in this ledger")]
    NotInLedger(EntryId),

    /// A save is running; the list cannot change under it.
    #[error("A save is already in progress")]
    SaveInProgress,

    /// The gateway refused or could not be reached; the entry was kept.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl DeleteError {
    /// Returns the error code for logs.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotInLedger(_) => "NOT_IN_LEDGER",
            Self::SaveInProgress => "SAVE_IN_PROGRESS",
            Self::Gateway(GatewayError::NotFound { .. }) => "NOT_FOUND",
            Self::Gateway(_) => "GATEWAY_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::LocalId;
    use serde_json::json;

    #[test]
    fn test_save_error_messages() {
        let err = SaveError::from(GatewayError::Rejected {
            status: 500,
            error: "Failed to update transaction.".to_string(),
            details: Some(json!("deadlock")),
        });
        assert_eq!(err.user_message(), "Failed to update transaction.");
        assert_eq!(err.details(), Some(&json!("deadlock")));

        let err = SaveError::from(DateError::InvalidDisplayFormat("x".to_string()));
        assert!(err.user_message().contains("DD/MM/YYYY"));
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_delete_error_codes() {
        assert_eq!(
            DeleteError::NotInLedger(EntryId::Pending(LocalId(1))).error_code(),
            "NOT_IN_LEDGER"
        );
        assert_eq!(DeleteError::SaveInProgress.error_code(), "SAVE_IN_PROGRESS");
        assert_eq!(
            DeleteError::Gateway(GatewayError::NotFound {
                error: "Transaction not found.".to_string(),
                details: None,
            })
            .error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            DeleteError::Gateway(GatewayError::Network("refused".to_string())).error_code(),
            "GATEWAY_ERROR"
        );
    }

    #[test]
    fn test_reconcile_error_display() {
        assert_eq!(
            ReconcileError::SaveInProgress.to_string(),
            "A save is already in progress"
        );
    }
}
