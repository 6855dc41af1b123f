//! Core ledger logic for Ledgerbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Entry computation, running balances, date normalization, and the reconciliation
//! of locally edited entries against the Persistence Gateway all live here.
//!
//! # Modules
//!
//! - `ledger` - Client ledger entries, balances, and save reconciliation

pub mod ledger;
