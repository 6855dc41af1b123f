//! Transaction repository for ledger rows.
//!
//! Amounts are rounded to the column scale before anything else, and `total`
//! is always derived here from the rounded amounts, whatever the caller
//! believes it to be.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerbook_core::ledger::{derive_total, normalize_amount};
use ledgerbook_shared::{ClientId, TransactionId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use crate::entities::{clients, transactions};

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Owning client not found.
    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    /// An amount or the derived total is too large for its column.
    #[error("Amounts are out of range")]
    AmountOutOfRange,

    /// Credit, debit and price cannot be negative.
    #[error("Amounts cannot be negative")]
    NegativeAmount,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Owning client.
    pub client_id: ClientId,
    /// Transaction date.
    pub date: NaiveDate,
    /// Description.
    pub description: String,
    /// Credited quantity.
    pub credit: Decimal,
    /// Debited quantity.
    pub debit: Decimal,
    /// Unit price.
    pub price: Decimal,
}

/// Input for updating a transaction. `None` keeps the stored value.
#[derive(Debug, Clone)]
pub struct UpdateTransactionInput {
    /// New date.
    pub date: NaiveDate,
    /// New description; `None` or empty keeps the stored one.
    pub description: Option<String>,
    /// New credit.
    pub credit: Option<Decimal>,
    /// New debit.
    pub debit: Option<Decimal>,
    /// New price.
    pub price: Option<Decimal>,
}

/// Amounts as written to a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowAmounts {
    credit: Decimal,
    debit: Decimal,
    price: Decimal,
    total: Decimal,
}

impl RowAmounts {
    fn new(credit: Decimal, debit: Decimal, price: Decimal) -> Result<Self, TransactionError> {
        if [credit, debit, price].iter().any(|a| *a < Decimal::ZERO) {
            return Err(TransactionError::NegativeAmount);
        }
        let credit = normalize_amount(credit).ok_or(TransactionError::AmountOutOfRange)?;
        let debit = normalize_amount(debit).ok_or(TransactionError::AmountOutOfRange)?;
        let price = normalize_amount(price).ok_or(TransactionError::AmountOutOfRange)?;
        let total = derive_total(debit, credit, price).ok_or(TransactionError::AmountOutOfRange)?;
        Ok(Self {
            credit,
            debit,
            price,
            total,
        })
    }
}

/// Transaction repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: Arc<DatabaseConnection>,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists a client's transactions ordered by date, then id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_client(
        &self,
        client_id: ClientId,
    ) -> Result<Vec<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::ClientId.eq(client_id.into_inner()))
            .order_by_asc(transactions::Column::Date)
            .order_by_asc(transactions::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: TransactionId,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(self.db.as_ref())
            .await
    }

    /// Creates a transaction for an existing client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An amount is negative, or an amount or the total is out of range
    /// - The client does not exist
    /// - Database operation fails
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let amounts = RowAmounts::new(input.credit, input.debit, input.price)?;

        clients::Entity::find_by_id(input.client_id.into_inner())
            .one(self.db.as_ref())
            .await?
            .ok_or(TransactionError::ClientNotFound(input.client_id))?;

        let now = chrono::Utc::now().into();
        let row = transactions::ActiveModel {
            client_id: Set(input.client_id.into_inner()),
            date: Set(input.date),
            description: Set(input.description),
            credit: Set(amounts.credit),
            debit: Set(amounts.debit),
            price: Set(amounts.price),
            total: Set(amounts.total),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = row.insert(self.db.as_ref()).await?;
        debug!(id = created.id, client_id = created.client_id, "Transaction created");
        Ok(created)
    }

    /// Updates a transaction, keeping stored values for omitted fields.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The transaction does not exist
    /// - An amount is negative, or an amount or the total is out of range
    /// - Database operation fails
    pub async fn update(
        &self,
        id: TransactionId,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(TransactionError::NotFound(id))?;

        let description = input
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| existing.description.clone());
        let amounts = RowAmounts::new(
            input.credit.unwrap_or(existing.credit),
            input.debit.unwrap_or(existing.debit),
            input.price.unwrap_or(existing.price),
        )?;

        let mut row: transactions::ActiveModel = existing.into();
        row.date = Set(input.date);
        row.description = Set(description);
        row.credit = Set(amounts.credit);
        row.debit = Set(amounts.debit);
        row.price = Set(amounts.price);
        row.total = Set(amounts.total);
        row.updated_at = Set(chrono::Utc::now().into());

        Ok(row.update(self.db.as_ref()).await?)
    }

    /// Deletes a transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction does not exist or the delete fails.
    pub async fn delete(&self, id: TransactionId) -> Result<(), TransactionError> {
        let result = transactions::Entity::delete_by_id(id.into_inner())
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(TransactionError::NotFound(id));
        }
        Ok(())
    }
}
