//! Database seeder for Ledgerbook development.
//!
//! Creates a demo client with a handful of ledger rows so the ledger view has
//! something to show. Running it twice does nothing the second time.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use ledgerbook_db::{
    ClientRepository, TransactionRepository, repositories::CreateTransactionInput,
};
use ledgerbook_shared::ClientId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Name of the seeded client.
const DEMO_CLIENT: &str = "Demo Farm Supplies";

/// (date, description, credit, debit, price)
const DEMO_ROWS: [(&str, &str, Decimal, Decimal, Decimal); 4] = [
    ("2024-01-05", "Opening stock", dec!(0), dec!(40), dec!(12.50)),
    ("2024-01-12", "Seed delivery", dec!(0), dec!(15), dec!(8.20)),
    ("2024-01-20", "Returned sacks", dec!(6), dec!(0), dec!(12.50)),
    ("2024-02-02", "Fertilizer", dec!(0), dec!(3), dec!(42)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = Arc::new(
        ledgerbook_db::connect(&database_url)
            .await
            .context("Failed to connect to database")?,
    );

    let clients = ClientRepository::new(db.clone());
    if clients.list().await?.iter().any(|c| c.name == DEMO_CLIENT) {
        println!("  Demo client already exists, skipping...");
        return Ok(());
    }

    println!("Seeding demo client...");
    let client = clients.create(DEMO_CLIENT).await?;
    let client_id = ClientId(client.id);

    println!("Seeding transactions...");
    let transactions = TransactionRepository::new(db);
    for (date, description, credit, debit, price) in DEMO_ROWS {
        let row = transactions
            .create(CreateTransactionInput {
                client_id,
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
                description: description.to_string(),
                credit,
                debit,
                price,
            })
            .await?;
        println!("  {} {} total={}", row.date, row.description, row.total);
    }

    println!("Seeding complete!");
    Ok(())
}
