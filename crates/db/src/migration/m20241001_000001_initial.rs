//! Initial schema: clients and their ledger transactions.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS transactions, clients CASCADE;")
            .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
CREATE TABLE clients (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE transactions (
    id SERIAL PRIMARY KEY,
    client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    date DATE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0,
    price NUMERIC(19, 4) NOT NULL DEFAULT 0,
    total NUMERIC(23, 8) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Ledger view: one client's rows in date order
CREATE INDEX idx_transactions_client_date ON transactions(client_id, date, id);
";
